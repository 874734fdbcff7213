//! Best-effort machine fingerprint used to bind the credential file to a host.
//!
//! Not a security boundary. The fingerprint changes when the host name
//! changes or the OS is reinstalled, which makes an existing credential file
//! undecryptable (reported as a decryption error, never a crash).
//!
//! Layout: `hostname|machine|system[|platform-uuid][|machine-id]`, where
//! `machine` and `system` use the `uname`-style names (`x86_64`, `arm64`,
//! `AMD64`; `Linux`, `Darwin`, `Windows`). Files written by earlier releases
//! of the tool were keyed with exactly these bytes.

use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Separator between fingerprint components.
const SEPARATOR: &str = "|";

/// Upper bound for the `ioreg` call.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

const MACHINE_ID_PATH: &str = "/etc/machine-id";

/// Host identifier bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct MachineFingerprint(Vec<u8>);

impl MachineFingerprint {
    /// Fingerprint of the current host. Never fails; identifiers that cannot
    /// be read are left out.
    pub fn current() -> Self {
        let os = std::env::consts::OS;
        let platform_uuid = if os == "macos" {
            run_command("ioreg", &["-rd1", "-c", "IOPlatformExpertDevice"])
                .and_then(|out| parse_ioreg_uuid(&out))
        } else {
            None
        };
        let components = assemble(
            &sysinfo::System::host_name().unwrap_or_default(),
            os,
            std::env::consts::ARCH,
            platform_uuid,
            read_machine_id(Path::new(MACHINE_ID_PATH)),
        );
        tracing::debug!(
            components = components.len(),
            "assembled machine fingerprint"
        );
        Self::from_components(&components)
    }

    /// Build a fingerprint from explicit components, joined in order.
    pub fn from_components<S: AsRef<str>>(components: &[S]) -> Self {
        let joined = components
            .iter()
            .map(|c| c.as_ref())
            .collect::<Vec<_>>()
            .join(SEPARATOR);
        Self(joined.into_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for MachineFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MachineFingerprint({} bytes)", self.0.len())
    }
}

/// Host name, machine and system are always present, even when empty.
fn assemble(
    host: &str,
    os: &str,
    arch: &str,
    platform_uuid: Option<String>,
    machine_id: Option<String>,
) -> Vec<String> {
    let mut components = vec![
        host.trim().to_string(),
        machine_name(os, arch).to_string(),
        system_name(os).to_string(),
    ];
    components.extend(platform_uuid);
    components.extend(machine_id);
    components
}

/// `uname -s` style OS name.
fn system_name(os: &str) -> &str {
    match os {
        "linux" | "android" => "Linux",
        "macos" | "ios" => "Darwin",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        "openbsd" => "OpenBSD",
        "netbsd" => "NetBSD",
        "dragonfly" => "DragonFly",
        "solaris" | "illumos" => "SunOS",
        other => other,
    }
}

/// `uname -m` style machine name (`PROCESSOR_ARCHITECTURE` on Windows).
fn machine_name<'a>(os: &str, arch: &'a str) -> &'a str {
    match (os, arch) {
        ("macos" | "ios", "aarch64") => "arm64",
        ("windows", "x86_64") => "AMD64",
        ("windows", "aarch64") => "ARM64",
        ("windows", "x86") => "x86",
        (_, "x86") => "i686",
        (_, "powerpc64") => "ppc64",
        (_, other) => other,
    }
}

/// Trimmed contents; an existing but blank file still contributes a component.
fn read_machine_id(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|contents| contents.trim().to_string())
}

/// Run a command and return its stdout, or `None` on any failure or timeout.
fn run_command(program: &str, args: &[&str]) -> Option<String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    let deadline = Instant::now() + COMMAND_TIMEOUT;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) if Instant::now() < deadline => {
                std::thread::sleep(Duration::from_millis(20));
            }
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                tracing::debug!(program, "fingerprint command timed out");
                return None;
            }
        }
    }

    let output = child.wait_with_output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

fn parse_ioreg_uuid(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains("IOPlatformUUID"))
        .and_then(|line| line.rsplit('=').next())
        .map(|value| value.trim().trim_matches('"').to_string())
}
