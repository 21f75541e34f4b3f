use gotypes::{ParseDirectoryOptions, parse_directory, resolve_references};

/// Converts and resolves a real Go tree, e.g. `GOTYPES_CORPUS=$(go env GOROOT)/src`.
#[test]
fn converts_go_corpus_if_configured() {
    let Some(root) = std::env::var_os("GOTYPES_CORPUS") else {
        eprintln!("GOTYPES_CORPUS not set; skipping corpus test");
        return;
    };

    let units = match parse_directory(ParseDirectoryOptions {
        base_dir: root.into(),
        resolve_module: false,
        include_test_files: false,
    }) {
        Ok(units) => units,
        Err(err) => panic!("Go corpus conversion failed: {err}"),
    };

    let declarations: usize = units.iter().map(|u| u.declarations.len()).sum();
    let stats = resolve_references(&units);
    assert!(stats.resolved <= stats.references);

    eprintln!(
        "Converted {} files, {declarations} declarations; resolved {}/{} references.",
        units.len(),
        stats.resolved,
        stats.references
    );
}
