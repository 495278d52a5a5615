//! Hermetic project sandbox for CLI tests.
//!
//! - Isolated `HOME` and global git config, so commits work without the
//!   developer's identity or hooks leaking in
//! - Write fixture files, initialise a git repository and commit them
//! - Run the binary under test via `assert_cmd`, or any program via `duct`
//!
//! Everything lives under an `assert_fs::TempDir` and is cleaned up on drop.
//!
//! ## Quick example
//! ```no_run
//! use scaffold_test_utils::sandbox::Sandbox;
//!
//! let mut sb = Sandbox::new();
//! sb.write("src/plugin.json", "{}").git_init().commit_all("init");
//!
//! let output = sb.run("scaffold", ["update"], None).unwrap();
//! println!("{output}");
//! ```

use assert_fs::TempDir;
use assert_fs::fixture::PathChild;
use duct::Expression;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Output;

pub struct Sandbox {
    root: TempDir,
    pub home: PathBuf,
    pub gitconfig: PathBuf,
    default_cwd: PathBuf,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    /// Create a new sandbox; all state is under an auto-cleaned TempDir.
    pub fn new() -> Self {
        let root = TempDir::new().expect("create sandbox TempDir");
        let home = root.child("home").to_path_buf();
        let gitconfig = home.join(".gitconfig");
        let project = root.child("project").to_path_buf();

        fs::create_dir_all(&home).expect("create home dir");
        fs::create_dir_all(&project).expect("create project dir");

        let s = Self {
            root,
            home,
            gitconfig,
            default_cwd: project,
        };
        s.write_gitconfig();
        s
    }

    /// Directory commands run in and fixture paths are relative to.
    pub fn project_path(&self) -> &Path {
        &self.default_cwd
    }

    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Write/overwrite a file relative to the project directory.
    pub fn write<P: AsRef<Path>, S: AsRef<[u8]>>(&mut self, rel: P, contents: S) -> &mut Self {
        let p = self.default_cwd.join(rel);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(p, contents).expect("write file");
        self
    }

    /// Read a project file, `None` when it does not exist.
    pub fn read<P: AsRef<Path>>(&self, rel: P) -> Option<String> {
        fs::read_to_string(self.default_cwd.join(rel)).ok()
    }

    pub fn git_init(&mut self) -> &mut Self {
        self.git(&["init", "--quiet"]);
        self
    }

    /// Stage all changes and commit with the given message.
    pub fn commit_all<S: AsRef<str>>(&mut self, msg: S) -> &mut Self {
        self.git(&["add", "-A"]);
        self.git(&["commit", "--quiet", "-m", msg.as_ref()]);
        self
    }

    /// Commit subjects, newest first.
    pub fn git_log(&self) -> Vec<String> {
        self.cmd("git", ["log", "--format=%s"])
            .read()
            .map(|out| out.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Build a `duct::Expression` pre-wired with the sandbox env and project cwd.
    pub fn cmd<S: AsRef<OsStr>, I: IntoIterator>(&self, program: S, args: I) -> Expression
    where
        I::Item: AsRef<OsStr>,
    {
        let program_str = program.as_ref().to_string_lossy();
        let args: Vec<_> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_string_lossy().to_string())
            .collect();
        let expr = duct::cmd(program_str.as_ref(), args).dir(&self.default_cwd);
        self.inject_env(expr)
    }

    /// Run a cargo binary inside this sandbox and return stdout as String.
    /// Errors if the process exits with non-zero status.
    pub fn run<I>(&self, program: &str, args: I, cwd: Option<&Path>) -> Result<String, String>
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        self.bin_expr(program, args, cwd)
            .read()
            .map_err(|e| format!("command failed: {e}"))
    }

    /// Run a cargo binary and capture its output whatever the exit status.
    pub fn run_output<I>(&self, program: &str, args: I) -> Output
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        self.bin_expr(program, args, None)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .expect("spawn binary")
    }

    fn bin_expr<I>(&self, program: &str, args: I, cwd: Option<&Path>) -> Expression
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let cargo_bin_path = assert_cmd::cargo::cargo_bin(program)
            .to_string_lossy()
            .to_string();
        let args: Vec<_> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_string_lossy().to_string())
            .collect();
        let working_dir = match cwd {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => self.default_cwd.join(dir),
            None => self.default_cwd.clone(),
        };
        self.inject_env(duct::cmd(&cargo_bin_path, args).dir(working_dir))
    }

    fn git(&self, args: &[&str]) {
        self.cmd("git", args)
            .stdout_null()
            .stderr_null()
            .run()
            .unwrap_or_else(|e| panic!("git {args:?} failed: {e}"));
    }

    fn write_gitconfig(&self) {
        let mut f = File::create(&self.gitconfig).expect("create gitconfig file");
        writeln!(
            f,
            r#"[user]
    name = Sandbox
    email = test@example.com
[init]
    defaultBranch = main
[commit]
    gpgsign = false
"#
        )
        .expect("write gitconfig");
    }

    pub fn inject_env(&self, expr: Expression) -> Expression {
        let mut env_map: HashMap<String, String> = HashMap::new();
        if let Ok(path) = std::env::var("PATH") {
            env_map.insert("PATH".into(), path);
        }
        env_map.insert("HOME".into(), self.home.to_string_lossy().into_owned());
        env_map.insert(
            "XDG_CONFIG_HOME".into(),
            self.home.to_string_lossy().into_owned(),
        );
        env_map.insert(
            "GIT_CONFIG_GLOBAL".into(),
            self.gitconfig.to_string_lossy().into_owned(),
        );
        env_map.insert(
            "GIT_CONFIG_SYSTEM".into(),
            if cfg!(windows) { "NUL" } else { "/dev/null" }.into(),
        );
        env_map.insert("NO_COLOR".into(), "1".into());
        expr.full_env(&env_map)
    }
}
