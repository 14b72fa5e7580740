/**
 * Template Manager Tests
 *
 * Cache hits, timestamp invalidation, trusted mode and concurrent lookups.
 */

#[path = "../util/mod.rs"]
mod utils;

#[cfg(test)]
mod manager_tests {
    use super::utils::*;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::SystemTime;
    use template_engine::cache::{CacheStore, MemoryCacheStore, TemplateManager};
    use template_engine::config::{CacheMode, EngineConfig};
    use template_engine::error::ErrorKind;
    use template_engine::file_system::{FileSystem, MemoryFileSystem, OsFileSystem};

    const MAIN: &str = "/app/main.tpl";
    const PART: &str = "/app/part.tpl";

    struct Fixture {
        fs: Arc<MemoryFileSystem>,
        store: Arc<MemoryCacheStore>,
        manager: TemplateManager,
    }

    fn fixture(mode: CacheMode) -> Fixture {
        let fs = Arc::new(MemoryFileSystem::with_files([
            (MAIN, "<com:Panel><%include App.part %></com:Panel>"),
            (PART, "<com:Label Text=\"a\" />"),
        ]));
        let store = Arc::new(MemoryCacheStore::new());
        let config = EngineConfig::default()
            .with_namespace("App", "/app")
            .with_cache_mode(mode);
        let manager = TemplateManager::new(config, fs.clone(), Arc::new(registry())).with_cache(store.clone());
        Fixture { fs, store, manager }
    }

    mod lookups {
        use super::*;

        #[test]
        fn should_return_cached_template_when_files_are_unchanged() {
            let f = fixture(CacheMode::Validate);
            let first = f.manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            let second = f.manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            assert!(Arc::ptr_eq(&first, &second));
            assert_eq!(first.nodes().len(), 2);
            assert_eq!(first.hash(), second.hash());
        }

        #[test]
        fn should_store_entries_under_prefixed_key() {
            let f = fixture(CacheMode::Validate);
            f.manager.template_by_file(Path::new(MAIN)).unwrap();
            let entry = f.store.get("template:/app/main.tpl").unwrap();
            assert_eq!(entry.timestamps.len(), 2);
            assert_eq!(f.store.len(), 1);
        }

        #[test]
        fn should_return_none_for_missing_file() {
            let f = fixture(CacheMode::Validate);
            assert!(f.manager.template_by_file(Path::new("/app/missing.tpl")).unwrap().is_none());
        }

        #[test]
        fn should_find_template_by_type_name() {
            let f = fixture(CacheMode::Validate);
            f.fs.write("/app/controls/Card.tpl", "<com:Btn />");
            let template = f
                .manager
                .template_for_type(Path::new("/app/controls"), "Card")
                .unwrap()
                .unwrap();
            assert_eq!(template.nodes()[0].type_name(), Some("Btn"));
            assert_eq!(template.context_path(), Path::new("/app/controls"));
        }

        #[test]
        fn should_parse_every_time_without_cache() {
            let fs = Arc::new(MemoryFileSystem::with_files([(MAIN, "<com:Btn />")]));
            let manager = TemplateManager::new(EngineConfig::default(), fs, Arc::new(registry()));
            let first = manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            let second = manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            assert!(!Arc::ptr_eq(&first, &second));
            assert_eq!(*first, *second);
        }

        #[test]
        fn should_report_parse_errors_with_file_location() {
            let fs = Arc::new(MemoryFileSystem::with_files([(MAIN, "\n</com:Btn>")]));
            let manager = TemplateManager::new(EngineConfig::default(), fs, Arc::new(registry()));
            let error = manager.template_by_file(Path::new(MAIN)).unwrap_err();
            assert_eq!(error.location.file(), Some(Path::new(MAIN)));
            assert_eq!(error.line(), 2);
        }
    }

    mod invalidation {
        use super::*;

        #[test]
        fn should_reparse_when_template_file_changes() {
            let f = fixture(CacheMode::Validate);
            let first = f.manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            f.fs.write(MAIN, "<com:Btn />");
            let second = f.manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            assert!(!Arc::ptr_eq(&first, &second));
            assert_eq!(second.nodes()[0].type_name(), Some("Btn"));
        }

        #[test]
        fn should_reparse_when_included_file_is_touched() {
            let f = fixture(CacheMode::Validate);
            let first = f.manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            f.fs.touch(Path::new(PART)).unwrap();
            let second = f.manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            assert!(!Arc::ptr_eq(&first, &second));
            assert_eq!(first.hash(), second.hash());
            let third = f.manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            assert!(Arc::ptr_eq(&second, &third));
        }

        #[test]
        fn should_report_removed_include_after_invalidation() {
            let f = fixture(CacheMode::Validate);
            f.manager.template_by_file(Path::new(MAIN)).unwrap();
            f.fs.remove(Path::new(PART)).unwrap();
            let error = f.manager.template_by_file(Path::new(MAIN)).unwrap_err();
            assert_eq!(error.kind, ErrorKind::UnresolvedInclude("App.part".to_string()));
        }

        #[test]
        fn should_trust_cached_entries_in_trusted_mode() {
            let f = fixture(CacheMode::Trusted);
            let first = f.manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            f.fs.write(MAIN, "<com:Btn />");
            f.fs.touch(Path::new(PART)).unwrap();
            let second = f.manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            assert!(Arc::ptr_eq(&first, &second));
        }
    }

    /// Rewrites `target` right after its first read has returned the old
    /// content.
    struct WriteDuringRead {
        inner: MemoryFileSystem,
        target: PathBuf,
        replacement: &'static str,
        written: AtomicBool,
    }

    impl FileSystem for WriteDuringRead {
        fn exists(&self, path: &Path) -> bool {
            self.inner.exists(path)
        }

        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            let content = self.inner.read_to_string(path)?;
            if path == self.target && !self.written.swap(true, Ordering::SeqCst) {
                self.inner.write(path, self.replacement);
            }
            Ok(content)
        }

        fn modified(&self, path: &Path) -> io::Result<SystemTime> {
            self.inner.modified(path)
        }
    }

    fn racing_manager(target: &str) -> TemplateManager {
        let fs = WriteDuringRead {
            inner: MemoryFileSystem::with_files([
                (MAIN, "<com:Label /><%include App.part %>"),
                (PART, "<com:Label />"),
            ]),
            target: PathBuf::from(target),
            replacement: "<com:Btn />",
            written: AtomicBool::new(false),
        };
        TemplateManager::new(
            EngineConfig::default().with_namespace("App", "/app"),
            Arc::new(fs),
            Arc::new(registry()),
        )
        .with_cache(Arc::new(MemoryCacheStore::new()))
    }

    mod write_during_read {
        use super::*;

        #[test]
        fn should_not_cache_old_content_as_current_when_template_changes() {
            let manager = racing_manager(MAIN);
            let first = manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            assert_eq!(first.nodes()[0].type_name(), Some("Label"));

            let second = manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            assert_eq!(second.nodes()[0].type_name(), Some("Btn"));
        }

        #[test]
        fn should_not_cache_old_content_as_current_when_include_changes() {
            let manager = racing_manager(PART);
            let first = manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            assert_eq!(first.nodes()[1].type_name(), Some("Label"));

            let second = manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            assert_eq!(second.nodes()[1].type_name(), Some("Btn"));
            let third = manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            assert!(Arc::ptr_eq(&second, &third));
        }
    }

    mod concurrency {
        use super::*;

        #[test]
        fn should_serve_concurrent_lookups_with_complete_templates() {
            let f = fixture(CacheMode::Validate);
            let expected = f.manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
            f.store.clear();

            std::thread::scope(|scope| {
                for worker in 0..8 {
                    let manager = &f.manager;
                    let fs = &f.fs;
                    let expected = &expected;
                    scope.spawn(move || {
                        for round in 0..25 {
                            if worker == 0 && round % 5 == 0 {
                                fs.touch(Path::new(PART)).unwrap();
                            }
                            let template = manager.template_by_file(Path::new(MAIN)).unwrap().unwrap();
                            assert_eq!(template.nodes(), expected.nodes());
                            assert_eq!(template.hash(), expected.hash());
                        }
                    });
                }
            });
        }
    }

    mod real_files {
        use super::*;

        #[test]
        fn should_load_and_cache_templates_from_disk() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("Home.tpl");
            std::fs::write(&path, "<com:Label Text=\"home\" />").unwrap();

            let manager = TemplateManager::new(
                EngineConfig::default(),
                Arc::new(OsFileSystem::new()),
                Arc::new(registry()),
            )
            .with_cache(Arc::new(MemoryCacheStore::new()));

            let first = manager.template_for_type(dir.path(), "Home").unwrap().unwrap();
            let second = manager.template_by_file(&path).unwrap().unwrap();
            assert!(Arc::ptr_eq(&first, &second));
            assert_eq!(first.source_file(), Some(path.as_path()));
        }
    }
}
