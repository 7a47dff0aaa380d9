use std::fs;
use std::path::Path;

use depmap::graph::{GraphSnapshot, NodeType};
use depmap::trace::{TraceOptions, build_import_graph};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write module");
}

fn sample_project() -> TempDir {
    let temp = TempDir::new().expect("temp dir");
    let root = temp.path();
    write(
        root,
        "main.py",
        "import os\nfrom pkg.mod import helper\ntry:\n    from pkg.extra import thing\nexcept ImportError:\n    pass\n",
    );
    write(root, "pkg/__init__.py", "");
    write(
        root,
        "pkg/mod.py",
        "from pkg.sub import value\nimport requests\n\ndef helper():\n    return value\n",
    );
    write(root, "pkg/sub.py", "from pkg.mod import helper\nvalue = 1\n");
    write(root, "pkg/extra.py", "thing = 2\n");
    temp
}

fn node_ids(graph: &GraphSnapshot) -> Vec<&str> {
    graph.nodes.iter().map(|node| node.id.as_str()).collect()
}

fn edges(graph: &GraphSnapshot) -> Vec<(&str, &str)> {
    graph
        .links
        .iter()
        .map(|link| (link.source.as_str(), link.target.as_str()))
        .collect()
}

#[test]
fn traces_local_modules_with_default_options() {
    let project = sample_project();
    let options = TraceOptions {
        project_root: project.path().to_path_buf(),
        ..TraceOptions::default()
    };

    let graph = build_import_graph(Path::new("main.py"), &options).expect("trace succeeds");

    assert_eq!(
        node_ids(&graph),
        vec!["main.py", "pkg/__init__.py", "pkg/mod.py", "pkg/sub.py"]
    );
    assert_eq!(graph.nodes[0].node_type, NodeType::Root);
    assert!(
        graph.nodes[1..]
            .iter()
            .all(|node| node.node_type == NodeType::Local)
    );
    assert_eq!(
        edges(&graph),
        vec![
            ("main.py", "pkg/__init__.py"),
            ("main.py", "pkg/mod.py"),
            ("pkg/mod.py", "pkg/sub.py"),
            ("pkg/sub.py", "pkg/mod.py"),
        ]
    );
}

#[test]
fn optional_imports_add_third_party_and_conditional_edges() {
    let project = sample_project();
    let options = TraceOptions {
        project_root: project.path().to_path_buf(),
        include_third_party: true,
        include_conditional_imports: true,
    };

    let graph = build_import_graph(Path::new("main.py"), &options).expect("trace succeeds");

    assert_eq!(
        node_ids(&graph),
        vec![
            "main.py",
            "os",
            "pkg/__init__.py",
            "pkg/mod.py",
            "pkg/sub.py",
            "requests",
            "pkg/extra.py",
        ]
    );
    assert_eq!(
        graph.node("requests").map(|node| node.node_type),
        Some(NodeType::ThirdParty)
    );
    assert_eq!(
        edges(&graph),
        vec![
            ("main.py", "os"),
            ("main.py", "pkg/__init__.py"),
            ("main.py", "pkg/mod.py"),
            ("pkg/mod.py", "pkg/sub.py"),
            ("pkg/sub.py", "pkg/mod.py"),
            ("pkg/mod.py", "requests"),
            ("main.py", "pkg/extra.py"),
        ]
    );
}

#[test]
fn entry_without_imports_is_a_single_root() {
    let temp = TempDir::new().expect("temp dir");
    write(temp.path(), "lonely.py", "print('hi')\n");
    let options = TraceOptions {
        project_root: temp.path().to_path_buf(),
        ..TraceOptions::default()
    };

    let graph = build_import_graph(Path::new("lonely.py"), &options).expect("trace succeeds");
    assert_eq!(node_ids(&graph), vec!["lonely.py"]);
    assert!(graph.links.is_empty());
}

#[test]
fn missing_entry_is_an_error() {
    let temp = TempDir::new().expect("temp dir");
    let options = TraceOptions {
        project_root: temp.path().to_path_buf(),
        ..TraceOptions::default()
    };

    let error = build_import_graph(Path::new("nope.py"), &options).expect_err("trace fails");
    assert!(error.to_string().contains("nope.py"));
}

#[test]
fn string_contents_and_one_line_blocks_do_not_confuse_the_trace() {
    let temp = TempDir::new().expect("temp dir");
    let root = temp.path();
    write(
        root,
        "main.py",
        "BANNER = '\"\"\" # import hidden'; from pkg.mod import helper\nif DEBUG: from pkg.extra import thing\n",
    );
    write(root, "pkg/__init__.py", "");
    write(root, "pkg/mod.py", "helper = 1\n");
    write(root, "pkg/extra.py", "thing = 2\n");

    let mut options = TraceOptions {
        project_root: root.to_path_buf(),
        ..TraceOptions::default()
    };
    let graph = build_import_graph(Path::new("main.py"), &options).expect("trace succeeds");
    assert_eq!(
        node_ids(&graph),
        vec!["main.py", "pkg/__init__.py", "pkg/mod.py"]
    );

    options.include_conditional_imports = true;
    let graph = build_import_graph(Path::new("main.py"), &options).expect("trace succeeds");
    assert_eq!(
        node_ids(&graph),
        vec!["main.py", "pkg/__init__.py", "pkg/mod.py", "pkg/extra.py"]
    );
}
