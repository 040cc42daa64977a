use draft_downloader::template::materialize;
use draft_downloader::types::EditorVariant;
use std::fs;

#[tokio::test]
async fn test_materialize_copies_nested_skeleton() {
    let root = tempfile::tempdir().unwrap();
    let template = root.path().join("templates/template");
    fs::create_dir_all(template.join("Resources/audioAlg")).unwrap();
    fs::write(template.join("draft_meta_info.json"), "{}").unwrap();
    fs::write(template.join("Resources/audioAlg/marker"), "x").unwrap();

    let draft_path = root.path().join("out/draft-1");
    materialize(&root.path().join("templates"), EditorVariant::Capcut, &draft_path)
        .await
        .unwrap();

    assert!(draft_path.join("draft_meta_info.json").is_file());
    assert!(draft_path.join("Resources/audioAlg/marker").is_file());
}

#[tokio::test]
async fn test_materialize_replaces_prior_run_completely() {
    let root = tempfile::tempdir().unwrap();
    let template = root.path().join("templates/template_jianying");
    fs::create_dir_all(&template).unwrap();
    fs::write(template.join("draft_meta_info.json"), "{}").unwrap();

    // Leftovers from a previous run of the same draft id.
    let draft_path = root.path().join("out/draft-1");
    fs::create_dir_all(draft_path.join("assets/audio")).unwrap();
    fs::write(draft_path.join("assets/audio/stale.mp3"), "old").unwrap();
    fs::write(draft_path.join("stale.json"), "old").unwrap();

    materialize(&root.path().join("templates"), EditorVariant::Jianying, &draft_path)
        .await
        .unwrap();

    assert!(draft_path.join("draft_meta_info.json").is_file());
    assert!(!draft_path.join("stale.json").exists());
    assert!(!draft_path.join("assets/audio/stale.mp3").exists());
}

#[tokio::test]
async fn test_materialize_fails_without_skeleton() {
    let root = tempfile::tempdir().unwrap();
    let draft_path = root.path().join("out/draft-1");

    let result = materialize(root.path(), EditorVariant::Capcut, &draft_path).await;
    assert!(result.is_err());
    assert!(!draft_path.exists());
}

#[tokio::test]
async fn test_variant_selects_skeleton_directory() {
    let root = tempfile::tempdir().unwrap();
    let capcut = root.path().join("templates/template");
    let jianying = root.path().join("templates/template_jianying");
    fs::create_dir_all(&capcut).unwrap();
    fs::create_dir_all(&jianying).unwrap();
    fs::write(capcut.join("which"), "capcut").unwrap();
    fs::write(jianying.join("which"), "jianying").unwrap();

    let draft_path = root.path().join("out/draft-1");
    materialize(&root.path().join("templates"), EditorVariant::Jianying, &draft_path)
        .await
        .unwrap();
    assert_eq!(fs::read_to_string(draft_path.join("which")).unwrap(), "jianying");
}
