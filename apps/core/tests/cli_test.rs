use plantfind_core::cli::fill_partitions_from_data_dir;
use plantfind_core::config::{self, Config};

#[test]
fn empty_partition_list_is_filled_from_the_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fruit_trees.json"), b"[]").unwrap();
    std::fs::write(dir.path().join("culinary_herbs.json"), b"[]").unwrap();

    let cfg = fill_partitions_from_data_dir(Config {
        partitions: Vec::new(),
        data_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    });

    assert_eq!(
        cfg.partitions,
        vec!["culinary_herbs".to_string(), "fruit_trees".to_string()]
    );
    assert!(config::validate(&cfg).is_ok());
}

#[test]
fn configured_partitions_are_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fruit_trees.json"), b"[]").unwrap();

    let cfg = fill_partitions_from_data_dir(Config {
        data_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    });

    assert_eq!(cfg.partitions.len(), 23);
}

#[test]
fn empty_partition_list_without_data_dir_stays_empty() {
    let cfg = fill_partitions_from_data_dir(Config {
        partitions: Vec::new(),
        ..Default::default()
    });

    assert!(cfg.partitions.is_empty());
    assert!(config::validate(&cfg).is_err());
}
