use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::Command;

const SERVICE_SUFFIX: &str = ".service";

/// What the service manager knows about a service name or pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceLookup {
    /// Installed services matching the name.
    pub count: usize,
    pub state: String,
    pub status: String,
    pub process_id: Option<u32>,
}

impl ServiceLookup {
    pub fn found(&self) -> bool {
        self.count > 0
    }

    fn matches(count: usize) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceState {
    Running,
    Starting,
    Stopping,
    Stopped,
    Failed,
    Unknown,
}

impl From<&str> for ServiceState {
    fn from(s: &str) -> Self {
        match s {
            "active" | "reloading" => ServiceState::Running,
            "activating" => ServiceState::Starting,
            "deactivating" => ServiceState::Stopping,
            "inactive" | "dead" => ServiceState::Stopped,
            "failed" => ServiceState::Failed,
            _ => ServiceState::Unknown,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Running => "Running",
            ServiceState::Starting => "Starting",
            ServiceState::Stopping => "Stopping",
            ServiceState::Stopped => "Stopped",
            ServiceState::Failed => "Failed",
            ServiceState::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Row of `systemctl list-unit-files --output=json`.
#[derive(Debug, Deserialize)]
struct UnitFileEntry {
    #[serde(alias = "unit")]
    unit_file: String,
    #[serde(default)]
    state: String,
}

/// Properties read from `systemctl show`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct UnitProperties {
    load_state: String,
    active_state: String,
    sub_state: String,
    result: String,
    main_pid: Option<u32>,
}

impl UnitProperties {
    fn state(&self) -> ServiceState {
        // Oneshot units stay "active" after their process has gone.
        if self.active_state == "active" && self.sub_state == "exited" {
            return ServiceState::Stopped;
        }
        ServiceState::from(self.active_state.as_str())
    }

    fn status(&self) -> String {
        if self.load_state != "loaded" {
            self.load_state.clone()
        } else if self.result == "success" {
            "OK".to_string()
        } else {
            self.result.clone()
        }
    }
}

pub struct ServiceManager {
    // No state needed, operates on systemctl
}

impl ServiceManager {
    pub fn new() -> Self {
        Self {}
    }

    /// Look up a service by name or glob pattern.
    ///
    /// State and PID are only read when exactly one unit matches.
    pub fn lookup(&self, name: &str) -> Result<ServiceLookup> {
        let pattern = unit_pattern(name);
        let units = self.matching_unit_files(&pattern)?;
        tracing::debug!(%pattern, ?units, "matched unit files");

        if units.len() != 1 {
            return Ok(ServiceLookup::matches(units.len()));
        }

        let properties = self.unit_properties(&units[0])?;
        if properties.load_state == "not-found" {
            return Ok(ServiceLookup::matches(0));
        }

        Ok(ServiceLookup {
            count: 1,
            state: properties.state().to_string(),
            status: properties.status(),
            process_id: properties.main_pid,
        })
    }

    fn matching_unit_files(&self, pattern: &str) -> Result<Vec<String>> {
        let output = Command::new("systemctl")
            .args(["list-unit-files", "--type=service", "--no-pager", "--output=json", "--"])
            .arg(pattern)
            .output()
            .context("Failed to run systemctl")?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        // systemctl exits non-zero when nothing matches the pattern.
        if !output.status.success() && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.trim().is_empty() || stderr.contains("0 unit files listed") {
                return Ok(Vec::new());
            }
            anyhow::bail!("Failed to list unit files: {}", first_line(&stderr));
        }

        parse_unit_files(&stdout)
    }

    fn unit_properties(&self, unit: &str) -> Result<UnitProperties> {
        let output = Command::new("systemctl")
            .args([
                "show",
                unit,
                "--no-pager",
                "--property=LoadState,ActiveState,SubState,Result,MainPID",
            ])
            .output()
            .context("Failed to run systemctl")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to show {}: {}", unit, first_line(&stderr));
        }

        Ok(parse_properties(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// `sshd` and `ssh*` become `sshd.service` and `ssh*.service`.
pub fn unit_pattern(name: &str) -> String {
    if name.ends_with(SERVICE_SUFFIX) {
        name.to_string()
    } else {
        format!("{}{}", name, SERVICE_SUFFIX)
    }
}

fn parse_unit_files(json: &str) -> Result<Vec<String>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }

    let entries: Vec<UnitFileEntry> =
        serde_json::from_str(json).context("Unexpected systemctl list-unit-files output")?;

    Ok(entries
        .into_iter()
        // Aliases point at another listed unit, templates are not runnable
        .filter(|entry| entry.state != "alias" && !entry.unit_file.ends_with("@.service"))
        .map(|entry| entry.unit_file)
        .collect())
}

/// systemctl can print several lines of diagnostics; keep the first useful one.
fn first_line(stderr: &str) -> &str {
    stderr
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no diagnostics")
}

fn parse_properties(stdout: &str) -> UnitProperties {
    let mut properties = UnitProperties::default();

    for line in stdout.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key {
            "LoadState" => properties.load_state = value.to_string(),
            "ActiveState" => properties.active_state = value.to_string(),
            "SubState" => properties.sub_state = value.to_string(),
            "Result" => properties.result = value.to_string(),
            "MainPID" => properties.main_pid = value.parse::<u32>().ok().filter(|pid| *pid > 0),
            _ => {}
        }
    }

    properties
}
