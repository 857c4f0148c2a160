//! Bootstrap fragment synthesis.
//!
//! Every page load starts from a small generated script: it binds the
//! serialized config to the `__config` global, then asks the client-side
//! loader (SystemJS) to import either a specific program or the program
//! switcher shell. The config statement must precede the import — the
//! imported module reads `__config` synchronously at load time.

use strand_config::Config;

use crate::discover::DiscoveredProgram;

/// Module specifier of the generic program-switcher shell, imported when no
/// program is pinned or requested.
pub const SWITCHER_SPECIFIER: &str = "./programs/root/program-switcher.js";

/// Synthesize the bootstrap fragment for one request.
///
/// Priority: a pinned `config.file` wins, then a per-request
/// `workspaceId/programId` pair, otherwise the switcher shell with the
/// discovered program list embedded. Route-level policy has already
/// rejected requests that conflict with pinned mode.
pub fn generate(
    config: &Config,
    requested: Option<&str>,
    programs: &[DiscoveredProgram],
) -> String {
    let config_json = serde_json::to_string(config).unwrap_or_else(|_| "{}".to_string());
    let mut fragment = format!("var __config = {config_json};\n");

    let target = config.file.as_deref().or(requested);
    match target {
        Some(file) => {
            fragment.push_str(&format!("SystemJS.import(\"../programs/{file}\");\n"));
        }
        None => {
            let addresses: Vec<String> =
                programs.iter().map(DiscoveredProgram::address).collect();
            let list_json =
                serde_json::to_string(&addresses).unwrap_or_else(|_| "[]".to_string());
            fragment.push_str(&format!("__config.programs = {list_json};\n"));
            fragment.push_str(&format!("SystemJS.import(\"{SWITCHER_SPECIFIER}\");\n"));
        }
    }
    fragment
}
