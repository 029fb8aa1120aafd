//! Resolution behavior through the public API: scope chain, options,
//! overlays and recipe templates against a realistic platform tree.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use boardwalk::config::{ConfigScope, RuntimeOverlay};
use boardwalk::platform::{BoardConfiguration, Platform};
use pretty_assertions::assert_eq;

fn load_platform() -> (common::PlatformFixture, Arc<Platform>) {
    let fixture = common::platform_fixture();
    // The fixture tree uses the bundled <install>/hardware/arduino/avr
    // layout, so identity is given explicitly.
    let platform =
        Arc::new(Platform::from_root(None, "arduino", "avr", &fixture.platform_dir).unwrap());
    (fixture, platform)
}

#[test]
fn platform_identity_and_display_name() {
    let (_fixture, platform) = load_platform();
    assert_eq!(platform.vendor(), "arduino");
    assert_eq!(platform.architecture(), "avr");
    assert_eq!(platform.display_name().as_deref(), Some("Test AVR Boards"));
}

#[test]
fn boards_are_listed_in_declaration_order() {
    let (_fixture, platform) = load_platform();
    let ids: Vec<String> =
        platform.boards().iter().map(|b| b.id().to_string()).collect();
    assert_eq!(ids, ["uno", "pro"]);
}

#[test]
fn board_keys_resolve_through_the_chain() {
    let (_fixture, platform) = load_platform();
    let board = platform.board("uno").unwrap();
    assert_eq!(board.value("build.mcu").as_deref(), Some("atmega328p"));
    // Platform-level template resolves with a board as context.
    assert_eq!(board.value("name").as_deref(), Some("Test Uno"));
    assert_eq!(board.fqbn(), "arduino:avr:uno");
    assert_eq!(board.value("build.arch").as_deref(), Some("AVR"));
}

#[test]
fn option_selection_drives_resolution_and_fqbn() {
    let (_fixture, platform) = load_platform();
    let board = Arc::new(platform.board("pro").unwrap());
    let choices = HashMap::from([("cpu".to_string(), "8MHzatmega328".to_string())]);
    let config = BoardConfiguration::new(board, &choices).unwrap();

    assert_eq!(config.fqbn(), "arduino:avr:pro:cpu=8MHzatmega328");
    assert_eq!(config.value("build.f_cpu").as_deref(), Some("8000000L"));
    assert_eq!(config.value("build.mcu").as_deref(), Some("atmega328p"));
}

#[test]
fn recipe_templates_resolve_with_runtime_overlay() {
    let (_fixture, platform) = load_platform();
    let board = Arc::new(platform.board("uno").unwrap());
    let config = BoardConfiguration::bare(board);

    let overlay = RuntimeOverlay::from([
        ("runtime.tools.avr-gcc.path".to_string(), "/tools/avr".to_string()),
        ("source_file".to_string(), "/src/wiring.c".to_string()),
        ("object_file".to_string(), "wiring.c.o".to_string()),
        ("includes".to_string(), " \"-I/core\"".to_string()),
    ]);
    let command = config.value_overlaid("recipe.c.o.pattern", &overlay).unwrap();
    assert_eq!(
        command,
        "\"/tools/avr/bin/avr-gcc\" -c -mmcu=atmega328p \"-I/core\" \"/src/wiring.c\" -o \"wiring.c.o\""
    );
}

#[test]
fn unresolved_tokens_survive_verbatim() {
    let (_fixture, platform) = load_platform();
    let board = platform.board("uno").unwrap();
    // No overlay: runtime tokens stay as-is, stored tokens resolve.
    let command = board.value("recipe.c.o.pattern").unwrap();
    assert!(command.contains("-mmcu=atmega328p"));
    assert!(command.contains("{source_file}"));
    assert!(command.contains("{runtime.tools.avr-gcc.path}"));
}

#[test]
fn missing_keys_are_absent_not_errors() {
    let (_fixture, platform) = load_platform();
    let board = platform.board("uno").unwrap();
    assert_eq!(board.value("upload.speed"), None);
}
