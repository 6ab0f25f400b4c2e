//! Generate and pull command integration tests.

use predicates::prelude::*;

use super::common::webfarm;

#[test]
fn generate_renders_every_host() {
  let env = webfarm();

  env
    .run("generate", "prod")
    .assert()
    .success()
    .stdout(predicate::str::contains("Generated 3 configuration sets for 3 hosts"));

  assert_eq!(
    env.read_file("generated/web1/etc/nginx/nginx.conf").as_deref(),
    Some("server_name web1;\nworkers 2;\n")
  );
  assert_eq!(
    env.read_file("generated/web2/etc/nginx/nginx.conf").as_deref(),
    Some("server_name web2;\nworkers 16;\n")
  );
  assert_eq!(
    env.read_file("generated/db1/etc/motd").as_deref(),
    Some("db1 is a db host in prod\n")
  );
  assert!(env.read_file("generated/db1/etc/nginx/nginx.conf").is_none());
  assert!(env.read_file("generated/web1/etc/nginx/.nginx.conf.swp").is_none());
}

#[test]
fn generate_can_be_limited_to_roles() {
  let env = webfarm();

  env.run("generate", "prod").args(["--roles", "db"]).assert().success();

  assert!(env.read_file("generated/db1/etc/motd").is_some());
  assert!(env.read_file("generated/web1/etc/motd").is_none());
}

#[test]
fn generate_can_be_limited_to_hosts() {
  let env = webfarm();

  env
    .run("generate", "prod")
    .args(["--hosts", "web2"])
    .assert()
    .success()
    .stdout(predicate::str::contains("for 1 hosts"));

  assert!(env.read_file("generated/web2/etc/nginx/nginx.conf").is_some());
  assert!(env.read_file("generated/web1/etc/motd").is_none());
}

#[test]
fn host_without_requested_role_fails() {
  let env = webfarm();

  env
    .run("generate", "prod")
    .args(["--hosts", "web1,db1", "--roles", "web"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("host 'db1' holds none of the requested roles: web"));

  assert!(env.read_file("generated/web1/etc/motd").is_none());
}

#[test]
fn generate_clears_stale_output() {
  let env = webfarm();
  env.write_file("generated/web1/etc/stale.conf", "old");

  env.run("generate", "prod").assert().success();

  assert!(env.read_file("generated/web1/etc/stale.conf").is_none());
  assert!(env.read_file("generated/web1/etc/motd").is_some());
}

#[test]
fn undefined_template_variable_fails() {
  let env = webfarm();
  env.write_file("templates/motd/etc/issue", "{{ missing.value }}");

  env
    .run("generate", "prod")
    .assert()
    .failure()
    .stderr(predicate::str::contains("missing"))
    .stderr(predicate::str::contains("host 'db1' (role 'db', environment 'prod')"));
}

#[test]
fn pull_copies_existing_remote_files() {
  let env = webfarm();
  env.write_remote("web1", "/etc/motd", "hand edited\n");

  env
    .run("pull", "prod")
    .assert()
    .success()
    .stdout(predicate::str::contains("Pulled 3 configuration sets"));

  assert_eq!(env.read_file("remotes/web1/etc/motd").as_deref(), Some("hand edited\n"));
  assert!(env.read_file("remotes/web1/etc/nginx/nginx.conf").is_none());
  assert!(env.read_file("generated/web1/etc/motd").is_none());
}
