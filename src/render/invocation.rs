//! Sandbox invocation
//!
//! The bubblewrap argument list as plain data, so what the renderer can see
//! is testable without spawning anything.

use std::ffi::OsString;
use std::path::PathBuf;

use super::types::RenderRequest;
use crate::config::SandboxConfig;

/// Where the workspace appears inside the sandbox
pub const SANDBOX_WORKSPACE: &str = "/workspace";
/// Where the host default stylesheet appears inside the sandbox
pub const SANDBOX_DEFAULT_STYLESHEET: &str = "/defaults/default.css";
pub const SANDBOX_PATH: &str = "/usr/local/bin:/usr/bin";

/// Host directories the renderer needs, bound at the same location
const SYSTEM_BINDS: &[&str] = &[
    "/usr",
    "/lib",
    "/lib64",
    "/bin",
    "/etc/fonts",
    "/var/cache/fontconfig",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsolationArg {
    Flag(&'static str),
    RoBind { source: PathBuf, dest: PathBuf },
    SetEnv { name: &'static str, value: String },
    Chdir(PathBuf),
}

impl IsolationArg {
    fn ro_bind(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        IsolationArg::RoBind {
            source: source.into(),
            dest: dest.into(),
        }
    }

    fn push_to(&self, args: &mut Vec<OsString>) {
        match self {
            IsolationArg::Flag(flag) => args.push(flag.into()),
            IsolationArg::RoBind { source, dest } => {
                args.push("--ro-bind".into());
                args.push(source.into());
                args.push(dest.into());
            }
            IsolationArg::SetEnv { name, value } => {
                args.push("--setenv".into());
                args.push(name.into());
                args.push(value.into());
            }
            IsolationArg::Chdir(dir) => {
                args.push("--chdir".into());
                args.push(dir.into());
            }
        }
    }
}

/// One fully resolved render command
#[derive(Debug, Clone)]
pub struct SandboxInvocation {
    pub launcher: PathBuf,
    pub isolation: Vec<IsolationArg>,
    pub renderer: PathBuf,
    pub renderer_args: Vec<String>,
}

impl SandboxInvocation {
    pub fn build(config: &SandboxConfig, request: &RenderRequest) -> Self {
        let mut isolation = vec![
            IsolationArg::Flag("--unshare-all"),
            IsolationArg::Flag("--new-session"),
            IsolationArg::Flag("--clearenv"),
        ];
        isolation.extend(SYSTEM_BINDS.iter().map(|dir| IsolationArg::ro_bind(*dir, *dir)));
        isolation.push(IsolationArg::ro_bind(
            &config.default_stylesheet_path,
            SANDBOX_DEFAULT_STYLESHEET,
        ));
        isolation.push(IsolationArg::ro_bind(&request.workspace_dir, SANDBOX_WORKSPACE));
        isolation.push(IsolationArg::Chdir(SANDBOX_WORKSPACE.into()));
        isolation.push(IsolationArg::SetEnv {
            name: "PATH",
            value: SANDBOX_PATH.to_string(),
        });

        // `-` makes weasyprint write the PDF to stdout
        let mut renderer_args = vec![
            request.html.clone(),
            "-".to_string(),
            "--stylesheet".to_string(),
            request.css.clone(),
        ];
        for attachment in &request.attachments {
            renderer_args.push("--attachment".to_string());
            renderer_args.push(attachment.clone());
        }

        Self {
            launcher: config.bwrap_path.clone(),
            isolation,
            renderer: config.weasyprint_path.clone(),
            renderer_args,
        }
    }

    /// Arguments passed to the launcher
    pub fn args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        for arg in &self.isolation {
            arg.push_to(&mut args);
        }
        args.push("--".into());
        args.push(self.renderer.clone().into());
        args.extend(self.renderer_args.iter().map(OsString::from));
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(attachments: &[&str]) -> RenderRequest {
        RenderRequest::new(
            PathBuf::from("/tmp/pdf-service-abc"),
            crate::ingest::PartSet {
                html: "doc.html".to_string(),
                css: "style.css".to_string(),
                attachments: attachments.iter().map(|a| a.to_string()).collect(),
            },
            Duration::from_secs(1),
        )
    }

    fn config() -> SandboxConfig {
        SandboxConfig {
            bwrap_path: PathBuf::from("/usr/bin/bwrap"),
            weasyprint_path: PathBuf::from("weasyprint"),
            default_stylesheet_path: PathBuf::from("/app/assets/custom.css"),
        }
    }

    fn joined(invocation: &SandboxInvocation) -> String {
        invocation
            .args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_full_argument_list() {
        let invocation = SandboxInvocation::build(&config(), &request(&["a.txt"]));
        assert_eq!(invocation.launcher, PathBuf::from("/usr/bin/bwrap"));
        assert_eq!(
            joined(&invocation),
            "--unshare-all --new-session --clearenv \
             --ro-bind /usr /usr --ro-bind /lib /lib --ro-bind /lib64 /lib64 --ro-bind /bin /bin \
             --ro-bind /etc/fonts /etc/fonts --ro-bind /var/cache/fontconfig /var/cache/fontconfig \
             --ro-bind /app/assets/custom.css /defaults/default.css \
             --ro-bind /tmp/pdf-service-abc /workspace --chdir /workspace \
             --setenv PATH /usr/local/bin:/usr/bin \
             -- weasyprint doc.html - --stylesheet style.css --attachment a.txt"
        );
    }

    #[test]
    fn test_attachments_keep_order() {
        let invocation = SandboxInvocation::build(&config(), &request(&["z.txt", "a.txt", "m.pdf"]));
        assert_eq!(
            &invocation.renderer_args[4..],
            &["--attachment", "z.txt", "--attachment", "a.txt", "--attachment", "m.pdf"]
        );
    }

    #[test]
    fn test_only_read_only_binds_and_path_env() {
        let invocation = SandboxInvocation::build(&config(), &request(&[]));
        for arg in &invocation.isolation {
            match arg {
                IsolationArg::Flag(flag) => {
                    assert!(["--unshare-all", "--new-session", "--clearenv"].contains(flag))
                }
                IsolationArg::RoBind { .. } | IsolationArg::Chdir(_) => {}
                IsolationArg::SetEnv { name, .. } => assert_eq!(*name, "PATH"),
            }
        }
        assert!(invocation
            .isolation
            .contains(&IsolationArg::ro_bind("/tmp/pdf-service-abc", SANDBOX_WORKSPACE)));
    }

    #[test]
    fn test_renderer_follows_separator() {
        let args = SandboxInvocation::build(&config(), &request(&[])).args();
        let separator = args.iter().position(|a| a == "--").unwrap();
        assert_eq!(args[separator + 1], "weasyprint");
        assert_eq!(args[separator + 2], "doc.html");
        assert_eq!(args[separator + 3], "-");
        assert_eq!(args.len(), separator + 6);
    }
}
