use crate::models::{ServerConfig, WizardData};
use serde::{Deserialize, Serialize};

const BASELINE_GAME_USER_SETTINGS: &str = include_str!("../assets/GameUserSettings.sample.ini");

const SERVER_SETTINGS: &str = "ServerSettings";
const SESSION_SETTINGS: &str = "SessionSettings";
const GAME_SESSION: &str = "/Script/Engine.GameSession";

pub fn baseline_game_user_settings() -> &'static str {
    BASELINE_GAME_USER_SETTINGS
}

/// Files and command line handed to the provisioning job for one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerArtifacts {
    pub server: String,
    pub launch_arguments: String,
    pub game_user_settings_ini: String,
    pub game_ini: String,
}

pub fn render_artifacts(data: &WizardData, server: &ServerConfig) -> ServerArtifacts {
    ServerArtifacts {
        server: server.name.clone(),
        launch_arguments: launch_arguments(data, server),
        game_user_settings_ini: render_game_user_settings(data, server),
        game_ini: data.game_ini.clone(),
    }
}

/// Lowercase cluster id shared by every server so players can transfer between them.
pub fn cluster_id(cluster_name: &str) -> String {
    let mut id = String::new();
    for c in cluster_name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            id.push(c.to_ascii_lowercase());
        } else if !id.ends_with('-') && !id.is_empty() {
            id.push('-');
        }
    }
    while id.ends_with('-') {
        id.pop();
    }
    if id.is_empty() {
        "cluster".to_string()
    } else {
        id
    }
}

pub fn launch_arguments(data: &WizardData, server: &ServerConfig) -> String {
    let mut url = format!(
        "{map}?listen?SessionName={session}?Port={port}?QueryPort={query}?RCONEnabled=True?RCONPort={rcon}?MaxPlayers={max}",
        map = server.map,
        session = server.session_name,
        port = server.game_port,
        query = server.query_port,
        rcon = server.rcon_port,
        max = server.max_players,
    );
    if !server.server_password.is_empty() {
        url.push_str(&format!("?ServerPassword={}", server.server_password));
    }
    if !server.admin_password.is_empty() {
        url.push_str(&format!("?ServerAdminPassword={}", server.admin_password));
    }

    let mut args = vec![url, format!("-clusterid={}", cluster_id(&data.cluster_name))];
    if !data.cluster_password.is_empty() {
        args.push(format!("-clusterpassword={}", data.cluster_password));
    }
    if !server.mods.is_empty() {
        args.push(format!("-mods={}", server.mods.join(",")));
    }
    args.push("-NoTransferFromFiltering".to_string());
    args.push("-log".to_string());
    args.join(" ")
}

/// Baseline, then the operator's raw ini text, then the structured settings and the
/// server's own session values. Later layers win key by key.
pub fn render_game_user_settings(data: &WizardData, server: &ServerConfig) -> String {
    let mut document = IniDocument::parse(BASELINE_GAME_USER_SETTINGS);
    if !data.game_user_settings_ini.trim().is_empty() {
        document.merge(&IniDocument::parse(&data.game_user_settings_ini));
    }

    for (key, value) in data.game_settings.ini_entries() {
        document.set(SERVER_SETTINGS, key, &value.to_string());
    }
    document.set(SERVER_SETTINGS, "ServerAdminPassword", &server.admin_password);
    document.set(SERVER_SETTINGS, "ServerPassword", &server.server_password);
    document.set(SERVER_SETTINGS, "RCONPort", &server.rcon_port.to_string());
    if !data.custom_dynamic_config_url.is_empty() {
        document.set(
            SERVER_SETTINGS,
            "CustomDynamicConfigUrl",
            &format!("\"{}\"", data.custom_dynamic_config_url),
        );
    }

    document.set(SESSION_SETTINGS, "SessionName", &server.session_name);
    document.set(SESSION_SETTINGS, "Port", &server.game_port.to_string());
    document.set(SESSION_SETTINGS, "QueryPort", &server.query_port.to_string());
    document.set(GAME_SESSION, "MaxPlayers", &server.max_players.to_string());

    document.render()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum IniLine {
    Entry { key: String, value: String },
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct IniSection {
    name: String,
    lines: Vec<IniLine>,
}

/// Order-preserving ini model. Comments and blank lines survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct IniDocument {
    sections: Vec<IniSection>,
}

impl IniDocument {
    fn parse(text: &str) -> Self {
        let mut document = IniDocument::default();
        let mut current = IniSection {
            name: String::new(),
            lines: Vec::new(),
        };

        for raw in text.lines() {
            let line = raw.trim();
            if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
                document.push_section(current);
                current = IniSection {
                    name: name.trim().to_string(),
                    lines: Vec::new(),
                };
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) if !line.starts_with(';') && !key.trim().is_empty() => {
                    current.lines.push(IniLine::Entry {
                        key: key.trim().to_string(),
                        value: value.trim().to_string(),
                    });
                }
                _ => current.lines.push(IniLine::Other(raw.trim_end().to_string())),
            }
        }
        document.push_section(current);
        document
    }

    fn push_section(&mut self, section: IniSection) {
        if section.name.is_empty() && section.lines.iter().all(is_blank) {
            return;
        }
        self.sections.push(section);
    }

    fn section_mut(&mut self, name: &str) -> &mut IniSection {
        let position = match self
            .sections
            .iter()
            .position(|section| section.name.eq_ignore_ascii_case(name))
        {
            Some(position) => position,
            None => {
                self.sections.push(IniSection {
                    name: name.to_string(),
                    lines: Vec::new(),
                });
                self.sections.len() - 1
            }
        };
        &mut self.sections[position]
    }

    fn set(&mut self, section: &str, key: &str, value: &str) {
        let section = self.section_mut(section);
        for line in section.lines.iter_mut() {
            if let IniLine::Entry {
                key: existing,
                value: current,
            } = line
            {
                if existing.eq_ignore_ascii_case(key) {
                    *current = value.to_string();
                    return;
                }
            }
        }
        let insert_at = section
            .lines
            .iter()
            .rposition(|line| !is_blank(line))
            .map(|idx| idx + 1)
            .unwrap_or(0);
        section.lines.insert(
            insert_at,
            IniLine::Entry {
                key: key.to_string(),
                value: value.to_string(),
            },
        );
    }

    /// Keys that precede any section header land in `[ServerSettings]`.
    fn merge(&mut self, other: &IniDocument) {
        for section in &other.sections {
            let target = if section.name.is_empty() {
                SERVER_SETTINGS
            } else {
                section.name.as_str()
            };
            for line in &section.lines {
                if let IniLine::Entry { key, value } = line {
                    self.set(target, key, value);
                }
            }
        }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            if !section.name.is_empty() {
                if !out.is_empty() && !out.ends_with("\n\n") {
                    out.push('\n');
                }
                out.push_str(&format!("[{}]\n", section.name));
            }
            let end = section
                .lines
                .iter()
                .rposition(|line| !is_blank(line))
                .map(|idx| idx + 1)
                .unwrap_or(0);
            for line in &section.lines[..end] {
                match line {
                    IniLine::Entry { key, value } => out.push_str(&format!("{key}={value}\n")),
                    IniLine::Other(text) => {
                        out.push_str(text);
                        out.push('\n');
                    }
                }
            }
        }
        out
    }
}

fn is_blank(line: &IniLine) -> bool {
    matches!(line, IniLine::Other(text) if text.trim().is_empty())
}
