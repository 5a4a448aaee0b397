//! Property-based tests for import resolution.
//!
//! These tests use proptest to generate random documents and verify that
//! resolution invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{lookup_in_table, parse_path};
    use crate::repo::Repo;
    use crate::settings::RepoSettings;
    use crate::transport::{Loader, MemoryTransport};
    use proptest::prelude::*;
    use toml::{Table, Value};

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::Integer),
            "[a-z ]{0,12}".prop_map(Value::String),
            any::<bool>().prop_map(Value::Boolean),
        ]
    }

    fn table(depth: u32) -> BoxedStrategy<Table> {
        let leaf = prop::collection::btree_map("[a-h]{1,5}", scalar(), 0..6);
        if depth == 0 {
            return leaf.prop_map(|map| map.into_iter().collect()).boxed();
        }
        (leaf, prop::collection::btree_map("[a-h]{1,5}", table(depth - 1), 0..3))
            .prop_map(|(scalars, children)| {
                let mut out: Table = scalars.into_iter().collect();
                for (key, child) in children {
                    out.insert(key, Value::Table(child));
                }
                out
            })
            .boxed()
    }

    fn load(document: &Table) -> Repo {
        let content = toml::to_string(document).unwrap();
        let memory = MemoryTransport::new().with_document("mem://test/repo.toml", content);
        let loader = Loader::new(RepoSettings::default()).with_transport("mem", memory);
        Repo::open_with("mem://test", &loader).unwrap()
    }

    proptest! {
        /// Property: a document without imports resolves to itself
        #[test]
        fn documents_without_imports_are_unchanged(document in table(2)) {
            let repo = load(&document);
            prop_assert_eq!(repo.config(), &document);
            prop_assert!(repo.imports().is_empty());
        }

        /// Property: an imported node equals its source node
        #[test]
        fn import_copies_source_node(source in table(1)) {
            let mut document = Table::new();
            document.insert("source".to_string(), Value::Table(source.clone()));
            let mut declaration = Table::new();
            declaration.insert("node".to_string(), Value::String("source".to_string()));
            let mut host = Table::new();
            host.insert("import".to_string(), Value::Table(declaration));
            document.insert("copy".to_string(), Value::Table(host));

            let repo = load(&document);
            let copy = lookup_in_table(repo.config(), &parse_path("copy"));
            prop_assert_eq!(copy, Some(&Value::Table(source)));
        }
    }
}
