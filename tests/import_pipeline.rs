//! End-to-end import pipeline against scripted external tools.
//!
//! The preprocessor and the dependency-probe compiler are shell scripts, so
//! these tests exercise the real process plumbing without a toolchain
//! installed. Unix only.
#![cfg(unix)]

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use boardwalk::core::BoardwalkError;
use boardwalk::env::ArduinoEnv;
use boardwalk::importer::Importer;
use boardwalk::platform::{BoardConfiguration, Platform};
use boardwalk::toolchain::ToolFinder;

struct PipelineFixture {
    fixture: common::PlatformFixture,
    env: ArduinoEnv,
    toolchain_bin: PathBuf,
    ino_file: PathBuf,
    servo_dir: PathBuf,
    wire_dir: PathBuf,
}

/// Install tree with a scripted arduino-builder, a scripted avr toolchain,
/// and a sketchbook with two libraries: the sketch includes Servo directly,
/// Servo's source includes a Wire header.
fn pipeline_fixture(builder_exit: i32) -> PipelineFixture {
    let fixture = common::platform_fixture();
    let root = fixture.root.path().to_path_buf();
    fs::create_dir_all(root.join("tools-builder")).unwrap();
    fs::create_dir_all(root.join("libraries")).unwrap();

    let sketchbook = root.join("sketchbook");
    let servo_dir = sketchbook.join("libraries/Servo");
    fs::create_dir_all(servo_dir.join("src")).unwrap();
    fs::write(servo_dir.join("src/Servo.h"), "#pragma once\n").unwrap();
    fs::write(servo_dir.join("src/Servo.cpp"), "#include <Wire.h>\n").unwrap();
    let wire_dir = sketchbook.join("libraries/Wire");
    fs::create_dir_all(&wire_dir).unwrap();
    fs::write(wire_dir.join("Wire.h"), "#pragma once\n").unwrap();
    fs::write(wire_dir.join("Wire.cpp"), "").unwrap();

    let sketch_dir = sketchbook.join("blink");
    fs::create_dir_all(&sketch_dir).unwrap();
    let ino_file = sketch_dir.join("blink.ino");
    fs::write(&ino_file, "void setup() {}\nvoid loop() {}\n").unwrap();

    // arduino-builder: leave a preprocessed sketch and an includes cache
    // naming Servo, then exit with the scripted status.
    common::write_script(
        &root.join("arduino-builder"),
        &format!(
            "#!/bin/sh\n\
             mkdir -p sketch\n\
             echo 'void setup();' > sketch/blink.ino.cpp\n\
             printf '[{{\"Sourcefile\":\"blink.ino.cpp\",\"Include\":\"Servo.h\",\"Includepath\":\"{}/src\"}}]' > includes.cache\n\
             exit {builder_exit}\n",
            servo_dir.display()
        ),
    );

    // avr-gcc: dependency probes report a Wire header for Servo sources.
    let toolchain_bin = root.join("toolchain/avr/bin");
    fs::create_dir_all(&toolchain_bin).unwrap();
    common::write_script(
        &toolchain_bin.join("avr-gcc"),
        &format!(
            "#!/bin/sh\n\
             for last; do :; done\n\
             case \"$last\" in\n\
               *Servo.cpp) echo \"Servo.o: $last \\\\\"; echo ' {}/Wire.h' ;;\n\
               *) echo \"probe.o: $last\" ;;\n\
             esac\n",
            wire_dir.display()
        ),
    );
    common::write_script(&toolchain_bin.join("avr-g++"), "#!/bin/sh\nexit 0\n");
    common::write_script(&toolchain_bin.join("avr-ar"), "#!/bin/sh\nexit 0\n");

    let env = ArduinoEnv::default()
        .with_install_dir(&root)
        .with_sketchbook_dir(&sketchbook);

    PipelineFixture { fixture, env, toolchain_bin, ino_file, servo_dir, wire_dir }
}

fn uno_config(platform_dir: &Path) -> BoardConfiguration {
    let platform = Arc::new(Platform::from_root(None, "arduino", "avr", platform_dir).unwrap());
    let board = Arc::new(platform.board("uno").unwrap());
    BoardConfiguration::bare(board)
}

#[tokio::test]
async fn full_import_produces_a_build_plan() {
    let fx = pipeline_fixture(0);
    let mut config = uno_config(&fx.fixture.platform_dir);
    let importer = Importer::new(fx.env.clone(), ToolFinder::new(&fx.toolchain_bin));

    let build_dir = fx.fixture.root.path().join("build");
    let plan = importer.import(&mut config, &fx.ino_file, Some(&build_dir)).await.unwrap();

    assert_eq!(plan.fqbn(), "arduino:avr:uno");
    assert!(plan.preprocessed().sketch_dir().join("blink.ino.cpp").exists());

    // Servo came from the includes cache, Wire from the closure.
    assert_eq!(plan.libraries().main, vec![fx.servo_dir.clone()]);
    assert_eq!(plan.libraries().auxiliary, vec![fx.wire_dir.clone()]);

    // Core recipes resolved against the scripted toolchain root.
    let toolchain_root = fx.toolchain_bin.parent().unwrap().parent().unwrap();
    let compile = &plan.core_makefile().compile_commands;
    assert_eq!(compile.len(), 2);
    assert!(compile
        .iter()
        .all(|c| c.contains(&format!("{}/bin/avr-g", toolchain_root.display()))));
    assert!(plan
        .core_makefile()
        .archive_commands
        .iter()
        .all(|c| c.contains("\"libCore.a\"")));

    // The injected runtime keys stayed on the configuration.
    use boardwalk::config::ConfigScope;
    assert_eq!(config.value("runtime.ide.version").as_deref(), Some("10802"));
    assert!(config.value("build.core.path").unwrap().ends_with("cores/arduino"));
}

#[tokio::test]
async fn failed_preprocess_aborts_and_removes_the_build_dir() {
    let fx = pipeline_fixture(7);
    let mut config = uno_config(&fx.fixture.platform_dir);
    let importer = Importer::new(fx.env.clone(), ToolFinder::new(&fx.toolchain_bin));

    let build_dir = fx.fixture.root.path().join("build");
    let err = importer
        .import(&mut config, &fx.ino_file, Some(&build_dir))
        .await
        .unwrap_err();

    let err = err.downcast::<BoardwalkError>().unwrap();
    assert!(matches!(err, BoardwalkError::ExternalToolFailure { code: 7, .. }));
    assert!(!build_dir.exists());
}

#[tokio::test]
async fn preexisting_build_dir_survives_a_failed_import() {
    let fx = pipeline_fixture(7);
    let mut config = uno_config(&fx.fixture.platform_dir);
    let importer = Importer::new(fx.env.clone(), ToolFinder::new(&fx.toolchain_bin));

    let build_dir = fx.fixture.root.path().join("build");
    fs::create_dir_all(&build_dir).unwrap();
    fs::write(build_dir.join("keep.txt"), "user data").unwrap();

    importer.import(&mut config, &fx.ino_file, Some(&build_dir)).await.unwrap_err();
    assert!(build_dir.join("keep.txt").exists());
}
