use std::path::{Path, PathBuf};

use doxysearch::db::Database;
use doxysearch::index::SearchIndex;
use doxysearch::models::*;
use speculate2::speculate;
use uuid::Uuid;

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/html/search")
}

fn import_fixtures(db: &Database) -> DocSet {
    db.import_dir("spacimac", &fixture_dir())
        .expect("Failed to import fixtures")
}

fn keys(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.key.as_str()).collect()
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "docsets" {
        describe "create_docset" {
            it "creates a docset with a trimmed name" {
                let docset = db.create_docset(CreateDocSetInput {
                    name: "  spacimac ".to_string(),
                    source_path: None,
                }).expect("Failed to create docset");

                assert_eq!(docset.name, "spacimac");
                assert!(docset.source_path.is_none());
            }

            it "rejects duplicate names" {
                db.create_docset(CreateDocSetInput {
                    name: "spacimac".to_string(),
                    source_path: None,
                }).expect("Failed to create docset");

                let err = db.create_docset(CreateDocSetInput {
                    name: "spacimac".to_string(),
                    source_path: None,
                }).unwrap_err();
                assert!(err.to_string().contains("already exists"));
            }

            it "rejects empty names" {
                let result = db.create_docset(CreateDocSetInput {
                    name: "   ".to_string(),
                    source_path: None,
                });
                assert!(result.is_err());
            }
        }

        describe "list_docsets" {
            it "returns docsets ordered by name" {
                for name in ["zeta", "alpha"] {
                    db.create_docset(CreateDocSetInput {
                        name: name.to_string(),
                        source_path: None,
                    }).expect("Failed to create");
                }

                let docsets = db.list_docsets().expect("Query failed");
                let names: Vec<_> = docsets.iter().map(|d| d.name.as_str()).collect();
                assert_eq!(names, vec!["alpha", "zeta"]);
            }
        }

        describe "get_docset" {
            it "returns None for a non-existent docset" {
                assert!(db.get_docset(Uuid::new_v4()).expect("Query failed").is_none());
                assert!(db.get_docset_by_name("missing").expect("Query failed").is_none());
            }
        }

        describe "delete_docset" {
            it "deletes the docset and its entries" {
                let docset = import_fixtures(&db);

                assert!(db.delete_docset(docset.id).expect("Failed to delete"));
                assert!(!db.delete_docset(docset.id).expect("Failed to delete"));

                let index = db.load_index(docset.id).expect("Query failed");
                assert!(index.is_empty());
            }
        }
    }

    describe "import_dir" {
        it "stores every fragment" {
            let docset = import_fixtures(&db);
            assert_eq!(docset.name, "spacimac");
            assert!(docset.source_path.is_some());

            let stats = db.stats(docset.id).expect("Query failed");
            let counts: Vec<_> = stats
                .categories
                .iter()
                .map(|c| (c.category, c.entries, c.symbols))
                .collect();
            assert_eq!(counts, vec![(Category::All, 8, 8), (Category::Functions, 12, 12)]);
        }

        it "replaces entries when imported again" {
            let first = import_fixtures(&db);
            let second = import_fixtures(&db);

            assert_eq!(first.id, second.id);
            assert!(second.updated_at >= first.updated_at);
            assert_eq!(db.list_docsets().expect("Query failed").len(), 1);

            let stats = db.stats(second.id).expect("Query failed");
            assert_eq!(stats.categories[0].entries, 8);
        }

        it "fails for a directory without fragments" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let err = db.import_dir("empty", dir.path()).unwrap_err();

            assert!(format!("{:#}", err).contains("no search index fragments"));
            assert!(db.get_docset_by_name("empty").expect("Query failed").is_none());
        }
    }

    describe "search" {
        it "matches key prefixes in key order" {
            let docset = import_fixtures(&db);

            let results = db.search(docset.id, "mat", Category::All, None).expect("Search failed");
            assert_eq!(keys(&results), vec!["material", "materialid", "materialofinstance"]);
        }

        it "treats underscores in keys literally" {
            let docset = import_fixtures(&db);

            let results = db.search(docset.id, "main.", Category::All, None).expect("Search failed");
            assert_eq!(keys(&results), vec!["main_2ecpp"]);
        }

        it "honours category and limit" {
            let docset = import_fixtures(&db);

            let results = db.search(docset.id, "s", Category::Functions, Some(3)).expect("Search failed");
            assert_eq!(keys(&results), vec!["satellite", "scene", "setrenderer"]);

            let results = db.search(docset.id, "s", Category::Classes, None).expect("Search failed");
            assert!(results.is_empty());
        }

        it "returns nothing for a blank query" {
            let docset = import_fixtures(&db);
            let results = db.search(docset.id, "  ", Category::All, None).expect("Search failed");
            assert!(results.is_empty());
        }
    }

    describe "entries" {
        it "returns an entry with all its links" {
            let docset = import_fixtures(&db);

            let entry = db
                .get_entry(docset.id, Category::Functions, "satellite")
                .expect("Query failed")
                .expect("Entry missing");
            assert_eq!(entry.symbols[0].label, "Satellite");
            assert_eq!(entry.link_count(), 3);
            assert_eq!(entry.symbols[0].links[2].scope, "SpaceElement::satellite()");
        }

        it "returns None for an unknown key" {
            let docset = import_fixtures(&db);
            let entry = db.get_entry(docset.id, Category::All, "nothing").expect("Query failed");
            assert!(entry.is_none());
        }

        it "lists a category in key order" {
            let docset = import_fixtures(&db);

            let entries = db.entries(docset.id, Category::Functions).expect("Query failed");
            assert_eq!(entries.len(), 12);
            assert_eq!(entries.first().map(|e| e.key.as_str()), Some("satellite"));
            assert_eq!(entries.last().map(|e| e.key.as_str()), Some("sun"));

            assert!(db.entries(docset.id, Category::Classes).expect("Query failed").is_empty());
        }

        it "round-trips the stored index" {
            let docset = import_fixtures(&db);
            let original = SearchIndex::load_dir(&fixture_dir()).expect("Failed to load fixtures");
            let stored = db.load_index(docset.id).expect("Query failed");

            let original: Vec<_> = original.fragments().map(|(n, e)| (*n, e.to_vec())).collect();
            let stored: Vec<_> = stored.fragments().map(|(n, e)| (*n, e.to_vec())).collect();
            assert_eq!(stored, original);
        }

        it "returns a stored fragment in file order" {
            let docset = import_fixtures(&db);

            let entries = db
                .fragment(docset.id, FragmentName::new(Category::All, 12))
                .expect("Query failed")
                .expect("Fragment missing");
            assert_eq!(entries.len(), 8);
            assert_eq!(entries[0].key, "main");

            let missing = db
                .fragment(docset.id, FragmentName::new(Category::All, 0))
                .expect("Query failed");
            assert!(missing.is_none());
        }
    }
}
