use anyhow::{Context, Result, anyhow};
use tree_sitter::{Node, Parser};

/// One imported dotted address, e.g. `pkg.mod` for `import pkg.mod` or
/// `pkg.mod.name` for `from pkg.mod import name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct ImportStatement {
    pub(super) address: String,
    /// Nested below a top-level statement (`if`, `try`, function body, ...).
    pub(super) conditional: bool,
}

/// Finds `import` and `from ... import` statements in Python source.
/// Relative imports are skipped.
pub(super) struct ImportScanner {
    parser: Parser,
}

impl ImportScanner {
    pub(super) fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .context("failed to load the Python grammar")?;
        Ok(Self { parser })
    }

    /// Imports in source order.
    pub(super) fn scan(&mut self, source: &str) -> Result<Vec<ImportStatement>> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| anyhow!("Python parser returned no tree"))?;
        let bytes = source.as_bytes();

        let mut imports = Vec::new();
        let mut cursor = tree.walk();
        // The root `module` sits at depth 0, top-level statements at 1.
        let mut depth = 0usize;

        loop {
            let node = cursor.node();
            let is_import = matches!(
                node.kind(),
                "import_statement" | "import_from_statement" | "future_import_statement"
            );
            if is_import {
                collect_statement(node, bytes, depth > 1, &mut imports);
            } else if cursor.goto_first_child() {
                depth += 1;
                continue;
            }

            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return Ok(imports);
                }
                depth -= 1;
            }
        }
    }
}

fn collect_statement(
    node: Node<'_>,
    source: &[u8],
    conditional: bool,
    imports: &mut Vec<ImportStatement>,
) {
    let module = match node.kind() {
        "import_statement" => None,
        "future_import_statement" => Some("__future__".to_owned()),
        _ => {
            let Some(module) = node.child_by_field_name("module_name") else {
                return;
            };
            if module.kind() == "relative_import" {
                return;
            }
            Some(node_text(module, source))
        }
    };

    let mut cursor = node.walk();
    let mut names = node
        .children_by_field_name("name", &mut cursor)
        .map(|name| imported_name(name, source))
        .collect::<Vec<_>>();
    if node
        .named_children(&mut cursor)
        .any(|child| child.kind() == "wildcard_import")
    {
        names.push("*".to_owned());
    }

    for name in names.into_iter().filter(|name| !name.is_empty()) {
        let address = match &module {
            Some(module) => format!("{module}.{name}"),
            None => name,
        };
        imports.push(ImportStatement {
            address,
            conditional,
        });
    }
}

/// The dotted name of an import entry, without its `as` alias.
fn imported_name(node: Node<'_>, source: &[u8]) -> String {
    let name = if node.kind() == "aliased_import" {
        node.child_by_field_name("name").unwrap_or(node)
    } else {
        node
    };
    node_text(name, source)
}

fn node_text(node: Node<'_>, source: &[u8]) -> String {
    node.utf8_text(source)
        .unwrap_or_default()
        .split_whitespace()
        .collect()
}
