use confab_lib::sync::{RunCommand, SyncError};

use super::common::{Project, RecordingRemote, TestConsole, options};

#[test]
fn components_and_exclusions_apply_to_runs() {
  let project = Project::new(
    r#"
    return {
      environments = { prod = { "web1" } },
      roles = { web = { "web1" } },
      components = { web = { "nginx", "motd" } },
      exclude = { "*.swp", "README*" },
      verbatim = { "etc/ssl/**" },
    }
    "#,
  );
  project.write("templates/nginx/etc/nginx/nginx.conf", "server_name {{ confab.host }};");
  project.write("templates/nginx/etc/nginx/.nginx.conf.swp", "junk");
  project.write("templates/nginx/README.md", "docs");
  project.write("templates/motd/etc/motd", "role {{ confab.role }}, component {{ confab.component }}");
  project.write("templates/nginx/etc/ssl/site.pem", "{{ not rendered }}");

  let remote = RecordingRemote::new(project.hosts_dir());
  project
    .run(RunCommand::Generate, &options("prod"), &remote, &mut TestConsole::default())
    .unwrap();

  assert_eq!(
    project.read("generated/web1/etc/nginx/nginx.conf").as_deref(),
    Some("server_name web1;\n")
  );
  assert_eq!(
    project.read("generated/web1/etc/motd").as_deref(),
    Some("role web, component motd\n")
  );
  assert_eq!(
    project.read("generated/web1/etc/ssl/site.pem").as_deref(),
    Some("{{ not rendered }}")
  );
  assert!(project.read("generated/web1/etc/nginx/.nginx.conf.swp").is_none());
  assert!(project.read("generated/web1/README.md").is_none());
}

#[test]
fn missing_environments_is_not_configured() {
  let project = Project::new("return { roles = { web = { 'web1' } } }");
  let remote = RecordingRemote::new(project.hosts_dir());

  let err = project
    .run(RunCommand::Diff, &options("prod"), &remote, &mut TestConsole::default())
    .unwrap_err();
  assert!(matches!(err, SyncError::NotConfigured));
}

#[test]
fn unknown_environment_names_it() {
  let project = Project::new("return { environments = { prod = { 'web1' } }, roles = { web = { 'web1' } } }");
  let remote = RecordingRemote::new(project.hosts_dir());

  let err = project
    .run(RunCommand::Generate, &options("qa"), &remote, &mut TestConsole::default())
    .unwrap_err();
  assert!(err.to_string().contains("qa"), "{}", err);
}
