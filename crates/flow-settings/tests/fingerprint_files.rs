use std::fs;

use flow_settings::{DesignSource, FileResource, SettingsError, Value, fingerprint};
use tempfile::TempDir;

fn design_with(source: DesignSource) -> Value {
    let mut rtl = Value::map();
    rtl.insert("top", Value::from("core"));
    rtl.insert("sources", Value::Sequence(vec![Value::from(source)]));
    let mut design = Value::map();
    design.insert("name", Value::from("core"));
    design.insert("rtl", rtl);
    design
}

#[test]
fn file_contents_feed_the_fingerprint() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("core.vhd");
    fs::write(&path, "entity core is end;\n").unwrap();
    let before = fingerprint(&design_with(DesignSource::new(&path).unwrap())).unwrap();

    fs::write(&path, "entity core is port (clk : in bit); end;\n").unwrap();
    let after = fingerprint(&design_with(DesignSource::new(&path).unwrap())).unwrap();

    assert_ne!(before, after);
}

#[test]
fn same_file_gives_same_fingerprint() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("top.sv");
    fs::write(&path, "module top; endmodule\n").unwrap();

    let first = fingerprint(&design_with(DesignSource::new(&path).unwrap())).unwrap();
    let second = fingerprint(&design_with(DesignSource::new(&path).unwrap())).unwrap();
    assert_eq!(first, second);
}

#[test]
fn vanished_file_fails_fingerprinting() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("init.hex");
    fs::write(&path, "00ff\n").unwrap();

    let mut generics = Value::map();
    generics.insert("INIT_FILE", Value::from(FileResource::new(&path).unwrap()));
    fs::remove_file(&path).unwrap();

    let err = fingerprint(&generics).unwrap_err();
    assert!(matches!(err, SettingsError::ResourceMissing { .. }), "{err}");
}
