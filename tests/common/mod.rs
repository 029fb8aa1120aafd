//! Fixture builders shared by the integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PLATFORM_TXT: &str = r#"# Test AVR platform
name=Test AVR Boards
version=1.8.6
compiler.path={runtime.tools.avr-gcc.path}/bin/
recipe.c.o.pattern="{runtime.tools.avr-gcc.path}/bin/avr-gcc" -c -mmcu={build.mcu}{includes} "{source_file}" -o "{object_file}"
recipe.cpp.o.pattern="{runtime.tools.avr-gcc.path}/bin/avr-g++" -c -mmcu={build.mcu}{includes} "{source_file}" -o "{object_file}"
recipe.S.o.pattern="{runtime.tools.avr-gcc.path}/bin/avr-gcc" -x assembler-with-cpp -c{includes} "{source_file}" -o "{object_file}"
recipe.ar.pattern="{runtime.tools.avr-gcc.path}/bin/avr-ar" rcs "{archive_file_path}" "{object_file}"
"#;

pub const BOARDS_TXT: &str = r#"menu.cpu=Processor

uno.name=Test Uno
uno.build.mcu=atmega328p
uno.build.f_cpu=16000000L
uno.build.core=arduino
uno.build.variant=standard

pro.name=Test Pro
pro.build.core=arduino
pro.build.variant=standard
pro.menu.cpu.16MHzatmega328=ATmega328P (5V, 16 MHz)
pro.menu.cpu.16MHzatmega328.build.mcu=atmega328p
pro.menu.cpu.16MHzatmega328.build.f_cpu=16000000L
pro.menu.cpu.8MHzatmega328=ATmega328P (3.3V, 8 MHz)
pro.menu.cpu.8MHzatmega328.build.mcu=atmega328p
pro.menu.cpu.8MHzatmega328.build.f_cpu=8000000L
"#;

/// A platform tree with two boards, a core, a variant and recipes.
pub struct PlatformFixture {
    pub root: TempDir,
    pub platform_dir: PathBuf,
}

pub fn platform_fixture() -> PlatformFixture {
    let root = TempDir::new().unwrap();
    let platform_dir = root.path().join("hardware/arduino/avr");
    fs::create_dir_all(&platform_dir).unwrap();
    fs::write(platform_dir.join("platform.txt"), PLATFORM_TXT).unwrap();
    fs::write(platform_dir.join("boards.txt"), BOARDS_TXT).unwrap();

    let core = platform_dir.join("cores/arduino");
    fs::create_dir_all(&core).unwrap();
    fs::write(core.join("wiring.c"), "/* core */\n").unwrap();
    fs::write(core.join("main.cpp"), "/* core */\n").unwrap();
    let variant = platform_dir.join("variants/standard");
    fs::create_dir_all(&variant).unwrap();
    fs::write(variant.join("pins_arduino.h"), "/* variant */\n").unwrap();

    PlatformFixture { root, platform_dir }
}

/// Write an executable shell script (test-only helper, unix).
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}
