use crate::defaults;
use crate::error::WizardError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ports are computed in `u32` so allocation never overflows; range checks belong to callers.
pub type Port = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PortAllocationMode {
    /// Three independent counters, one per port family.
    #[default]
    Sequential,
    /// One block of six consecutive ports per server.
    Even,
}

impl PortAllocationMode {
    /// Distance between the game ports of two neighbouring servers.
    pub fn stride(self) -> u32 {
        match self {
            PortAllocationMode::Sequential => 1,
            PortAllocationMode::Even => defaults::EVEN_BLOCK_SIZE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PortAllocationMode::Sequential => "sequential",
            PortAllocationMode::Even => "even",
        }
    }
}

impl std::fmt::Display for PortAllocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PortAllocationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(PortAllocationMode::Sequential),
            "even" => Ok(PortAllocationMode::Even),
            other => Err(format!("unknown port allocation mode: {other}")),
        }
    }
}

fn default_count() -> u32 {
    1
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedMap {
    pub map: String,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl SelectedMap {
    pub fn new(map: impl Into<String>, count: u32) -> Self {
        let map = map.into();
        let display_name = defaults::map_display_name(&map).map(str::to_string);
        Self {
            map,
            count,
            enabled: true,
            display_name,
        }
    }

    /// Counts below one still place a single server.
    pub fn effective_count(&self) -> u32 {
        self.count.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerModOverride {
    pub additional_mods: Vec<String>,
    pub exclude_shared_mods: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingValue::Bool(true) => f.write_str("True"),
            SettingValue::Bool(false) => f.write_str("False"),
            SettingValue::Number(value) if value.fract() == 0.0 => write!(f, "{value:.0}"),
            SettingValue::Number(value) => write!(f, "{value}"),
        }
    }
}

enum SettingSlot<'a> {
    Number(&'a mut f64),
    Bool(&'a mut bool),
}

/// Cluster-wide gameplay knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSettings {
    pub difficulty_offset: f64,
    pub override_official_difficulty: f64,
    pub xp_multiplier: f64,
    pub taming_speed_multiplier: f64,
    pub harvest_amount_multiplier: f64,
    pub day_cycle_speed_scale: f64,
    pub baby_mature_speed_multiplier: f64,
    pub egg_hatch_speed_multiplier: f64,
    pub structure_resistance_multiplier: f64,
    pub max_tamed_dinos: f64,
    #[serde(rename = "serverPVE")]
    pub server_pve: bool,
    pub allow_third_person_player: bool,
    pub show_map_player_location: bool,
    pub always_allow_structure_pickup: bool,
    #[serde(rename = "allowFlyerCarryPvE")]
    pub allow_flyer_carry_pve: bool,
    #[serde(rename = "disableStructureDecayPvE")]
    pub disable_structure_decay_pve: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            difficulty_offset: 1.0,
            override_official_difficulty: 5.0,
            xp_multiplier: 1.0,
            taming_speed_multiplier: 1.0,
            harvest_amount_multiplier: 1.0,
            day_cycle_speed_scale: 1.0,
            baby_mature_speed_multiplier: 1.0,
            egg_hatch_speed_multiplier: 1.0,
            structure_resistance_multiplier: 1.0,
            max_tamed_dinos: 5000.0,
            server_pve: false,
            allow_third_person_player: true,
            show_map_player_location: true,
            always_allow_structure_pickup: true,
            allow_flyer_carry_pve: false,
            disable_structure_decay_pve: false,
        }
    }
}

/// (draft key, `[ServerSettings]` ini key), in ini output order.
const GAME_SETTING_KEYS: &[(&str, &str)] = &[
    ("difficultyOffset", "DifficultyOffset"),
    ("overrideOfficialDifficulty", "OverrideOfficialDifficulty"),
    ("xpMultiplier", "XPMultiplier"),
    ("tamingSpeedMultiplier", "TamingSpeedMultiplier"),
    ("harvestAmountMultiplier", "HarvestAmountMultiplier"),
    ("dayCycleSpeedScale", "DayCycleSpeedScale"),
    ("babyMatureSpeedMultiplier", "BabyMatureSpeedMultiplier"),
    ("eggHatchSpeedMultiplier", "EggHatchSpeedMultiplier"),
    ("structureResistanceMultiplier", "StructureResistanceMultiplier"),
    ("maxTamedDinos", "MaxTamedDinos"),
    ("serverPVE", "ServerPVE"),
    ("allowThirdPersonPlayer", "AllowThirdPersonPlayer"),
    ("showMapPlayerLocation", "ShowMapPlayerLocation"),
    ("alwaysAllowStructurePickup", "AlwaysAllowStructurePickup"),
    ("allowFlyerCarryPvE", "AllowFlyerCarryPvE"),
    ("disableStructureDecayPvE", "DisableStructureDecayPvE"),
];

impl GameSettings {
    fn slot(&mut self, key: &str) -> Option<SettingSlot<'_>> {
        let slot = match key {
            "difficultyOffset" => SettingSlot::Number(&mut self.difficulty_offset),
            "overrideOfficialDifficulty" => {
                SettingSlot::Number(&mut self.override_official_difficulty)
            }
            "xpMultiplier" => SettingSlot::Number(&mut self.xp_multiplier),
            "tamingSpeedMultiplier" => SettingSlot::Number(&mut self.taming_speed_multiplier),
            "harvestAmountMultiplier" => SettingSlot::Number(&mut self.harvest_amount_multiplier),
            "dayCycleSpeedScale" => SettingSlot::Number(&mut self.day_cycle_speed_scale),
            "babyMatureSpeedMultiplier" => {
                SettingSlot::Number(&mut self.baby_mature_speed_multiplier)
            }
            "eggHatchSpeedMultiplier" => SettingSlot::Number(&mut self.egg_hatch_speed_multiplier),
            "structureResistanceMultiplier" => {
                SettingSlot::Number(&mut self.structure_resistance_multiplier)
            }
            "maxTamedDinos" => SettingSlot::Number(&mut self.max_tamed_dinos),
            "serverPVE" => SettingSlot::Bool(&mut self.server_pve),
            "allowThirdPersonPlayer" => SettingSlot::Bool(&mut self.allow_third_person_player),
            "showMapPlayerLocation" => SettingSlot::Bool(&mut self.show_map_player_location),
            "alwaysAllowStructurePickup" => {
                SettingSlot::Bool(&mut self.always_allow_structure_pickup)
            }
            "allowFlyerCarryPvE" => SettingSlot::Bool(&mut self.allow_flyer_carry_pve),
            "disableStructureDecayPvE" => SettingSlot::Bool(&mut self.disable_structure_decay_pve),
            _ => return None,
        };
        Some(slot)
    }

    /// Sets one knob by its draft key. Numbers must be finite and non-negative.
    pub fn set(&mut self, key: &str, value: SettingValue) -> Result<(), WizardError> {
        let slot = self
            .slot(key)
            .ok_or_else(|| WizardError::UnknownSetting(key.to_string()))?;
        match (slot, value) {
            (SettingSlot::Number(target), SettingValue::Number(number))
                if number.is_finite() && number >= 0.0 =>
            {
                *target = number;
                Ok(())
            }
            (SettingSlot::Number(_), _) => Err(WizardError::InvalidSettingValue {
                key: key.to_string(),
                expected: "a non-negative number",
            }),
            (SettingSlot::Bool(target), SettingValue::Bool(flag)) => {
                *target = flag;
                Ok(())
            }
            (SettingSlot::Bool(_), _) => Err(WizardError::InvalidSettingValue {
                key: key.to_string(),
                expected: "a boolean",
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<SettingValue> {
        let position = GAME_SETTING_KEYS
            .iter()
            .position(|(draft_key, _)| *draft_key == key)?;
        self.ini_entries().get(position).map(|(_, value)| *value)
    }

    /// `[ServerSettings]` key/value pairs in a stable order.
    pub fn ini_entries(&self) -> Vec<(&'static str, SettingValue)> {
        let values = [
            SettingValue::Number(self.difficulty_offset),
            SettingValue::Number(self.override_official_difficulty),
            SettingValue::Number(self.xp_multiplier),
            SettingValue::Number(self.taming_speed_multiplier),
            SettingValue::Number(self.harvest_amount_multiplier),
            SettingValue::Number(self.day_cycle_speed_scale),
            SettingValue::Number(self.baby_mature_speed_multiplier),
            SettingValue::Number(self.egg_hatch_speed_multiplier),
            SettingValue::Number(self.structure_resistance_multiplier),
            SettingValue::Number(self.max_tamed_dinos),
            SettingValue::Bool(self.server_pve),
            SettingValue::Bool(self.allow_third_person_player),
            SettingValue::Bool(self.show_map_player_location),
            SettingValue::Bool(self.always_allow_structure_pickup),
            SettingValue::Bool(self.allow_flyer_carry_pve),
            SettingValue::Bool(self.disable_structure_decay_pve),
        ];
        GAME_SETTING_KEYS
            .iter()
            .zip(values)
            .map(|((_, ini_key), value)| (*ini_key, value))
            .collect()
    }
}

/// Explicit port bases. `basePort` and `increment` are kept in step with the draft by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortConfiguration {
    pub base_port: Port,
    pub query_port_base: Port,
    pub rcon_port_base: Port,
    pub increment: u32,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            base_port: defaults::DEFAULT_GAME_PORT,
            query_port_base: defaults::DEFAULT_QUERY_PORT,
            rcon_port_base: defaults::DEFAULT_RCON_PORT,
            increment: PortAllocationMode::default().stride(),
        }
    }
}

/// Operator edits for one server position. `None` means "use the computed default".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_port: Option<Port>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_port: Option<Port>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rcon_port: Option<Port>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_players: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
}

impl ServerOverride {
    pub fn is_empty(&self) -> bool {
        *self == ServerOverride::default()
    }
}

/// One concrete server of the deployment plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub name: String,
    pub map: String,
    pub game_port: Port,
    pub query_port: Port,
    pub rcon_port: Port,
    pub max_players: u32,
    pub admin_password: String,
    pub server_password: String,
    pub session_name: String,
    pub mods: Vec<String>,
}

/// The in-progress cluster description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WizardData {
    pub cluster_name: String,
    pub description: String,
    pub server_count: u32,
    pub base_port: Port,
    pub port_allocation_mode: PortAllocationMode,
    pub selected_maps: Vec<SelectedMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_map: Option<String>,
    pub global_mods: Vec<String>,
    pub server_mods: BTreeMap<String, ServerModOverride>,
    pub game_settings: GameSettings,
    pub port_configuration: PortConfiguration,
    pub server_configs: Vec<ServerOverride>,
    /// Explicit servers supplied by an import; they replace map expansion.
    pub servers: Vec<ServerConfig>,
    pub max_players: u32,
    pub admin_password: String,
    pub server_password: String,
    pub cluster_password: String,
    pub custom_dynamic_config_url: String,
    pub game_ini: String,
    pub game_user_settings_ini: String,
}

impl Default for WizardData {
    fn default() -> Self {
        Self {
            cluster_name: String::new(),
            description: String::new(),
            server_count: 1,
            base_port: defaults::DEFAULT_GAME_PORT,
            port_allocation_mode: PortAllocationMode::default(),
            selected_maps: Vec::new(),
            custom_map: None,
            global_mods: Vec::new(),
            server_mods: BTreeMap::new(),
            game_settings: GameSettings::default(),
            port_configuration: PortConfiguration::default(),
            server_configs: Vec::new(),
            servers: Vec::new(),
            max_players: defaults::DEFAULT_MAX_PLAYERS,
            admin_password: String::new(),
            server_password: String::new(),
            cluster_password: String::new(),
            custom_dynamic_config_url: String::new(),
            game_ini: String::new(),
            game_user_settings_ini: String::new(),
        }
    }
}

impl WizardData {
    pub fn selected_map(&self, map: &str) -> Option<&SelectedMap> {
        self.selected_maps.iter().find(|entry| entry.map == map)
    }

    pub fn selected_map_mut(&mut self, map: &str) -> Option<&mut SelectedMap> {
        self.selected_maps.iter_mut().find(|entry| entry.map == map)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    #[default]
    Welcome,
    ClusterBasic,
    MapSelection,
    ServerConfig,
    IndividualServers,
    GameSettings,
    Mods,
    Review,
    Creating,
}

impl WizardStep {
    pub const ALL: [WizardStep; 9] = [
        WizardStep::Welcome,
        WizardStep::ClusterBasic,
        WizardStep::MapSelection,
        WizardStep::ServerConfig,
        WizardStep::IndividualServers,
        WizardStep::GameSettings,
        WizardStep::Mods,
        WizardStep::Review,
        WizardStep::Creating,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WizardStep::Welcome => "welcome",
            WizardStep::ClusterBasic => "cluster-basic",
            WizardStep::MapSelection => "map-selection",
            WizardStep::ServerConfig => "server-config",
            WizardStep::IndividualServers => "individual-servers",
            WizardStep::GameSettings => "game-settings",
            WizardStep::Mods => "mods",
            WizardStep::Review => "review",
            WizardStep::Creating => "creating",
        }
    }

    /// Following step. `server-config` and `individual-servers` are alternatives,
    /// so map selection continues to `server-config` and both rejoin at `game-settings`.
    pub fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::Welcome => Some(WizardStep::ClusterBasic),
            WizardStep::ClusterBasic => Some(WizardStep::MapSelection),
            WizardStep::MapSelection => Some(WizardStep::ServerConfig),
            WizardStep::ServerConfig | WizardStep::IndividualServers => {
                Some(WizardStep::GameSettings)
            }
            WizardStep::GameSettings => Some(WizardStep::Mods),
            WizardStep::Mods => Some(WizardStep::Review),
            WizardStep::Review => Some(WizardStep::Creating),
            WizardStep::Creating => None,
        }
    }

    /// Preceding step. Going back from `game-settings` always lands on `server-config`,
    /// the default of the two alternatives, whichever one was used going forward.
    pub fn previous(self) -> Option<WizardStep> {
        match self {
            WizardStep::Welcome => None,
            WizardStep::ClusterBasic => Some(WizardStep::Welcome),
            WizardStep::MapSelection => Some(WizardStep::ClusterBasic),
            WizardStep::ServerConfig | WizardStep::IndividualServers => {
                Some(WizardStep::MapSelection)
            }
            WizardStep::GameSettings => Some(WizardStep::ServerConfig),
            WizardStep::Mods => Some(WizardStep::GameSettings),
            WizardStep::Review => Some(WizardStep::Mods),
            WizardStep::Creating => Some(WizardStep::Review),
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WizardStep {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        WizardStep::ALL
            .into_iter()
            .find(|step| step.as_str() == trimmed)
            .ok_or_else(|| WizardError::UnknownStep(trimmed.to_string()))
    }
}
