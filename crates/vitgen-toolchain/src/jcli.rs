//! `jcli` process adapter.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use vitgen_core::error::VitgenError;
use vitgen_core::types::Discrimination;

use crate::locate::find_executable;
use crate::{CertificateTool, GenesisTool, KeyTool, Toolchain};

const TOOL: &str = "jcli";

/// Drives the `jcli` binary. Inputs go through stdin, results come back on stdout.
#[derive(Clone, Debug)]
pub struct Jcli {
    bin: PathBuf,
}

impl Jcli {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    /// Locate `jcli` in `tool_dir`, falling back to `PATH`.
    pub fn locate(tool_dir: Option<&Path>) -> Result<Self, VitgenError> {
        Ok(Self::new(find_executable(TOOL, tool_dir)?))
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    fn run(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<Vec<u8>, VitgenError> {
        debug!(bin = %self.bin.display(), ?args, "running jcli");

        let mut child = Command::new(&self.bin)
            .args(args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VitgenError::external_tool(TOOL, format!("spawn {}: {e}", self.bin.display())))?;

        let (output, written) = std::thread::scope(|s| {
            // The child may fill stdout before draining stdin.
            let writer = match (stdin, child.stdin.take()) {
                (Some(input), Some(mut pipe)) => Some(s.spawn(move || pipe.write_all(input))),
                _ => None,
            };
            let output = child.wait_with_output();
            let written = match writer {
                Some(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked"))),
                None => Ok(()),
            };
            (output, written)
        });
        let output = output?;
        let command = || format!("{TOOL} {}", args.join(" "));

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(VitgenError::external_tool(
                command(),
                if stderr.is_empty() { output.status.to_string() } else { stderr },
            ));
        }
        written.map_err(|e| VitgenError::external_tool(command(), format!("writing stdin: {e}")))?;
        Ok(output.stdout)
    }

    fn run_text(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<String, VitgenError> {
        let out = self.run(args, stdin)?;
        Ok(String::from_utf8_lossy(&out).trim().to_string())
    }
}

impl CertificateTool for Jcli {
    fn new_vote_plan_certificate(&self, descriptor: &[u8]) -> Result<String, VitgenError> {
        self.run_text(&["certificate", "new", "vote-plan"], Some(descriptor))
    }

    fn vote_plan_id(&self, certificate: &str) -> Result<String, VitgenError> {
        self.run_text(&["certificate", "get-vote-plan-id"], Some(certificate.as_bytes()))
    }

    fn sign_certificate(&self, certificate: &str, key_files: &[PathBuf]) -> Result<String, VitgenError> {
        let keys: Vec<String> = key_files.iter().map(|p| p.display().to_string()).collect();
        let mut args = vec!["certificate", "sign"];
        for key in &keys {
            args.push("--key");
            args.push(key);
        }
        self.run_text(&args, Some(certificate.as_bytes()))
    }
}

impl KeyTool for Jcli {
    fn generate_secret_key(&self) -> Result<String, VitgenError> {
        self.run_text(&["key", "generate", "--type", "Ed25519"], None)
    }

    fn public_key(&self, secret_key: &str) -> Result<String, VitgenError> {
        self.run_text(&["key", "to-public"], Some(secret_key.as_bytes()))
    }

    fn account_address(&self, public_key: &str, discrimination: Discrimination) -> Result<String, VitgenError> {
        let mut args = vec!["address", "account"];
        if discrimination == Discrimination::Test {
            args.push("--testing");
        }
        args.push(public_key);
        self.run_text(&args, None)
    }

    fn public_key_bytes(&self, public_key: &str) -> Result<String, VitgenError> {
        self.run_text(&["key", "to-bytes"], Some(public_key.as_bytes()))
    }

    fn vote_encryption_key(&self, member_keys: &[String]) -> Result<String, VitgenError> {
        let mut args = vec!["votes", "encrypting-vote-key"];
        for key in member_keys {
            args.push("--keys");
            args.push(key);
        }
        self.run_text(&args, None)
    }
}

impl GenesisTool for Jcli {
    fn encode(&self, yaml: &[u8]) -> Result<Vec<u8>, VitgenError> {
        self.run(&["genesis", "encode"], Some(yaml))
    }

    fn hash(&self, block0: &[u8]) -> Result<String, VitgenError> {
        self.run_text(&["genesis", "hash"], Some(block0))
    }

    fn decode(&self, block0: &[u8]) -> Result<String, VitgenError> {
        self.run_text(&["genesis", "decode"], Some(block0))
    }
}

impl Toolchain for Jcli {
    fn version(&self) -> Result<String, VitgenError> {
        self.run_text(&["--full-version"], None)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &Path, body: &str) -> Jcli {
        let bin = dir.join("jcli");
        std::fs::write(&bin, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
        Jcli::new(bin)
    }

    #[test]
    fn stdin_is_forwarded_and_output_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let jcli = script(dir.path(), "cat; echo");
        assert_eq!(jcli.public_key("ed25519_sk1abc").unwrap(), "ed25519_sk1abc");
    }

    #[test]
    fn failure_surfaces_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let jcli = script(dir.path(), "echo 'invalid certificate' >&2; exit 3");
        let err = jcli.vote_plan_id("garbage").unwrap_err();
        match err {
            VitgenError::ExternalTool { tool, stderr } => {
                assert_eq!(tool, "jcli certificate get-vote-plan-id");
                assert_eq!(stderr, "invalid certificate");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unread_stdin_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // closes its stdin without reading, then exits cleanly
        let jcli = script(dir.path(), "exec 0<&-; sleep 0.2; echo done");
        let input = vec![b'x'; 1 << 20];
        let err = jcli.encode(&input).unwrap_err();
        match err {
            VitgenError::ExternalTool { tool, stderr } => {
                assert_eq!(tool, "jcli genesis encode");
                assert!(stderr.starts_with("writing stdin"), "{stderr}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn arguments_reach_the_binary() {
        let dir = tempfile::tempdir().unwrap();
        let jcli = script(dir.path(), "cat >/dev/null; echo \"$@\"");
        assert_eq!(
            jcli.account_address("ed25519_pk1xyz", Discrimination::Test).unwrap(),
            "address account --testing ed25519_pk1xyz"
        );
        assert_eq!(
            jcli.sign_certificate("cert", &[PathBuf::from("/tmp/0_bft_secret.key")]).unwrap(),
            "certificate sign --key /tmp/0_bft_secret.key"
        );
    }
}
