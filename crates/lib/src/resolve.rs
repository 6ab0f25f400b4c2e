//! Host and role resolution.
//!
//! Turns an environment name plus optional explicit host and role filters
//! into a mapping of host to the roles it should be configured for.
//!
//! # Resolution Rules
//!
//! Checked in this order:
//!
//! 1. Hosts and roles given: the environment is not consulted. Each host gets
//!    the intersection of its actual roles with the requested roles.
//! 2. Only hosts given: each host gets all of its actual roles, whether or not
//!    it belongs to the environment.
//! 3. Only roles given: hosts of the environment holding any requested role,
//!    each restricted to the requested roles.
//! 4. Nothing given: every host of the environment with all of its roles.
//!    Hosts without any role are dropped.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

/// Resolution result: host name to the set of role names.
pub type HostRoleMap = BTreeMap<String, BTreeSet<String>>;

/// Environment name to its ordered host list.
pub type EnvironmentCatalog = BTreeMap<String, Vec<String>>;

/// Role name to the hosts holding it.
pub type RoleCatalog = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
  #[error("unknown environment '{0}'")]
  UnknownEnvironment(String),

  #[error("environment '{0}' has no hosts")]
  EmptyEnvironment(String),

  #[error("unknown role '{role}' in environment '{environment}'")]
  UnknownRole { environment: String, role: String },

  #[error("unknown host '{0}': it holds no roles")]
  UnknownHost(String),

  #[error("host '{host}' holds none of the requested roles: {}", roles.join(", "))]
  NoMatchingRoles { host: String, roles: Vec<String> },
}

/// One (environment, host, role) unit of work.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostAndRole {
  pub environment: String,
  pub host: String,
  pub role: String,
}

/// Resolves hosts and roles against the environment and role catalogs.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
  environments: &'a EnvironmentCatalog,
  roles: &'a RoleCatalog,
}

impl<'a> Resolver<'a> {
  pub fn new(environments: &'a EnvironmentCatalog, roles: &'a RoleCatalog) -> Self {
    Self { environments, roles }
  }

  /// Resolve the host to roles mapping.
  ///
  /// Empty `hosts` or `roles` slices mean "not specified".
  pub fn resolve(&self, environment: &str, hosts: &[String], roles: &[String]) -> Result<HostRoleMap, ResolutionError> {
    match (hosts.is_empty(), roles.is_empty()) {
      (false, false) => self.resolve_hosts_with_roles(hosts, roles),
      (false, true) => self.resolve_hosts(hosts),
      (true, false) => self.resolve_roles(environment, roles),
      (true, true) => self.resolve_environment(environment),
    }
  }

  /// All roles whose host list contains `host`.
  pub fn roles_of(&self, host: &str) -> BTreeSet<String> {
    self
      .roles
      .iter()
      .filter(|(_, hosts)| hosts.iter().any(|h| h == host))
      .map(|(role, _)| role.clone())
      .collect()
  }

  fn resolve_hosts_with_roles(&self, hosts: &[String], roles: &[String]) -> Result<HostRoleMap, ResolutionError> {
    let requested: BTreeSet<String> = roles.iter().cloned().collect();
    let mut result = HostRoleMap::new();

    for host in hosts {
      let actual = self.roles_of(host);
      if actual.is_empty() {
        return Err(ResolutionError::UnknownHost(host.clone()));
      }

      let matching: BTreeSet<String> = actual.intersection(&requested).cloned().collect();
      if matching.is_empty() {
        return Err(ResolutionError::NoMatchingRoles {
          host: host.clone(),
          roles: roles.to_vec(),
        });
      }
      result.insert(host.clone(), matching);
    }

    Ok(result)
  }

  fn resolve_hosts(&self, hosts: &[String]) -> Result<HostRoleMap, ResolutionError> {
    let mut result = HostRoleMap::new();

    for host in hosts {
      let actual = self.roles_of(host);
      if actual.is_empty() {
        return Err(ResolutionError::UnknownHost(host.clone()));
      }
      result.insert(host.clone(), actual);
    }

    Ok(result)
  }

  fn resolve_roles(&self, environment: &str, roles: &[String]) -> Result<HostRoleMap, ResolutionError> {
    let env_hosts = self.environment_hosts(environment)?;

    let mut role_hosts: BTreeSet<&str> = BTreeSet::new();
    for role in roles {
      let hosts = self.roles.get(role).ok_or_else(|| ResolutionError::UnknownRole {
        environment: environment.to_string(),
        role: role.clone(),
      })?;
      role_hosts.extend(hosts.iter().map(String::as_str));
    }

    let requested: BTreeSet<String> = roles.iter().cloned().collect();
    let mut result = HostRoleMap::new();

    for host in env_hosts.iter().filter(|h| role_hosts.contains(h.as_str())) {
      let matching: BTreeSet<String> = self.roles_of(host).intersection(&requested).cloned().collect();
      if !matching.is_empty() {
        result.insert(host.clone(), matching);
      }
    }

    Ok(result)
  }

  fn resolve_environment(&self, environment: &str) -> Result<HostRoleMap, ResolutionError> {
    let env_hosts = self.environment_hosts(environment)?;

    let mut result = HostRoleMap::new();
    for host in env_hosts {
      let actual = self.roles_of(host);
      if !actual.is_empty() {
        result.insert(host.clone(), actual);
      }
    }

    Ok(result)
  }

  fn environment_hosts(&self, environment: &str) -> Result<&'a [String], ResolutionError> {
    let hosts = self
      .environments
      .get(environment)
      .ok_or_else(|| ResolutionError::UnknownEnvironment(environment.to_string()))?;

    if hosts.is_empty() {
      return Err(ResolutionError::EmptyEnvironment(environment.to_string()));
    }

    Ok(hosts)
  }
}

/// Flatten a resolution result into units of work, host by host.
pub fn host_and_roles(environment: &str, map: &HostRoleMap) -> Vec<HostAndRole> {
  map
    .iter()
    .flat_map(|(host, roles)| {
      roles.iter().map(move |role| HostAndRole {
        environment: environment.to_string(),
        host: host.clone(),
        role: role.clone(),
      })
    })
    .collect()
}
