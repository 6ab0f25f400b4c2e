use confab_lib::sync::RunCommand;

use super::common::{Project, RecordingRemote, TestConsole, options};

const CONFIG: &str = r#"
return {
  environments = { prod = { "web1" } },
  roles = { web = { "web1" } },
}
"#;

/// Five templates on web1, two of which differ from the host.
fn five_files() -> Project {
  let project = Project::new(CONFIG);
  for (name, body) in [
    ("etc/a.conf", "a"),
    ("etc/b.conf", "b"),
    ("etc/c.conf", "c"),
    ("etc/d.conf", "d = {{ confab.host }}"),
    ("etc/e.conf", "e"),
  ] {
    project.write(&format!("templates/web/{}", name), body);
  }

  project.write_remote("web1", "/etc/a.conf", "a\n");
  project.write_remote("web1", "/etc/b.conf", "b\n");
  project.write_remote("web1", "/etc/c.conf", "old c\n");
  project.write_remote("web1", "/etc/d.conf", "d = web1\n");
  project
}

#[test]
fn declined_push_leaves_hosts_untouched() {
  let project = five_files();
  let remote = RecordingRemote::new(project.hosts_dir());

  let mut console = TestConsole::default();
  project
    .run(RunCommand::Diff, &options("prod"), &remote, &mut console)
    .unwrap();
  let before = console.changed();
  assert_eq!(before, vec!["/etc/c.conf", "/etc/e.conf"]);

  let mut console = TestConsole::answering(false);
  project
    .run(RunCommand::Push, &options("prod"), &remote, &mut console)
    .unwrap();
  assert_eq!(console.prompts.len(), 1);
  assert_eq!(console.prompts[0].0, "web1");
  assert_eq!(console.prompts[0].1, before);
  assert_eq!(remote.writes(), 0);
  assert_eq!(project.read_remote("web1", "/etc/c.conf").as_deref(), Some("old c\n"));
  assert!(project.read_remote("web1", "/etc/e.conf").is_none());

  let mut console = TestConsole::default();
  project
    .run(RunCommand::Diff, &options("prod"), &remote, &mut console)
    .unwrap();
  assert_eq!(console.changed(), before);
}

#[test]
fn confirmed_push_writes_only_changed_files() {
  let project = five_files();
  let remote = RecordingRemote::new(project.hosts_dir());

  let mut console = TestConsole::answering(true);
  let summary = project
    .run(RunCommand::Push, &options("prod"), &remote, &mut console)
    .unwrap();

  assert_eq!(summary.pushed, 2);
  assert_eq!(remote.puts(), 2);
  assert_eq!(project.read_remote("web1", "/etc/c.conf").as_deref(), Some("c\n"));
  assert_eq!(project.read_remote("web1", "/etc/e.conf").as_deref(), Some("e\n"));

  let mut console = TestConsole::default();
  project
    .run(RunCommand::Diff, &options("prod"), &remote, &mut console)
    .unwrap();
  assert!(console.changed().is_empty());
  assert_eq!(console.diffs.len(), 5);
}

#[test]
fn diff_never_writes() {
  let project = five_files();
  let remote = RecordingRemote::new(project.hosts_dir());

  let mut console = TestConsole::answering(true);
  project
    .run(RunCommand::Diff, &options("prod"), &remote, &mut console)
    .unwrap();

  assert!(console.prompts.is_empty());
  assert_eq!(remote.writes(), 0);
}

#[test]
fn pull_mirrors_existing_remote_files() {
  let project = five_files();
  let remote = RecordingRemote::new(project.hosts_dir());

  project
    .run(RunCommand::Pull, &options("prod"), &remote, &mut TestConsole::default())
    .unwrap();

  assert_eq!(project.read("remotes/web1/etc/c.conf").as_deref(), Some("old c\n"));
  assert!(project.read("remotes/web1/etc/e.conf").is_none());
  assert!(project.read("generated/web1/etc/c.conf").is_none());
}

#[test]
fn explicit_hosts_bypass_environment() {
  let project = Project::new(
    r#"
    return {
      environments = { prod = { "web1" }, staging = {} },
      roles = { web = { "web1", "web2" } },
    }
    "#,
  );
  project.write("templates/web/etc/motd", "{{ confab.environment }} {{ confab.host }}");
  let remote = RecordingRemote::new(project.hosts_dir());

  let mut opts = options("staging");
  opts.hosts = vec!["web2".to_string()];
  let summary = project
    .run(RunCommand::Generate, &opts, &remote, &mut TestConsole::default())
    .unwrap();

  assert_eq!(summary.hosts, 1);
  assert_eq!(project.read("generated/web2/etc/motd").as_deref(), Some("staging web2\n"));
  assert!(project.read("generated/web1/etc/motd").is_none());
}
