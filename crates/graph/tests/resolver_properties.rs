use fence_graph::{resolve, ResolutionKind};
use fence_workspace::{RepoPath, SourceTree, WorkspaceIndex, WorkspaceOptions};
use proptest::prelude::*;

fn fixture() -> SourceTree {
    SourceTree::from_files(
        "test",
        [
            ("packages/a/package.json", Some(r#"{"name":"@s/a"}"#)),
            ("packages/a/src/index.ts", Some("export * from './pub';")),
            ("packages/a/src/pub.ts", Some("")),
            ("packages/a/src/internal/x.ts", Some("")),
            ("packages/b/package.json", Some(r#"{"name":"@s/b"}"#)),
            ("packages/b/src/use.ts", Some("")),
        ],
    )
}

fn specifier() -> impl Strategy<Value = String> {
    let segment = prop::sample::select(vec![
        ".", "..", "a", "b", "src", "internal", "pub", "index", "x", "use", "packages", "@s",
        "", "pub.ts", "index.tsx",
    ]);
    let prefix = prop::sample::select(vec!["", "./", "../", "@s/", "@", "/"]);
    (prefix, prop::collection::vec(segment, 0..6))
        .prop_map(|(prefix, segments)| format!("{prefix}{}", segments.join("/")))
}

proptest! {
    #[test]
    fn resolution_is_total_and_consistent(spec in specifier(), from_b in any::<bool>()) {
        let tree = fixture();
        let index = WorkspaceIndex::discover(&tree, &WorkspaceOptions::default()).unwrap();
        let from = if from_b { "packages/b/src/use.ts" } else { "packages/a/src/index.ts" };
        let from = RepoPath::new(from).unwrap();

        let first = resolve(&from, &spec, &index);
        let second = resolve(&from, &spec, &index);
        prop_assert_eq!(&first, &second);

        match first.kind {
            ResolutionKind::Relative | ResolutionKind::Workspace => {
                let path = first.path.as_ref();
                prop_assert!(path.is_some_and(|p| tree.contains(p)));
            }
            ResolutionKind::External | ResolutionKind::Unresolved => {
                prop_assert!(first.path.is_none());
            }
            ResolutionKind::Forbidden => {
                if let Some(path) = &first.path {
                    prop_assert!(path.as_str().contains("/internal/"));
                }
            }
        }
    }

    #[test]
    fn arbitrary_text_never_panics(spec in ".{0,40}") {
        let tree = fixture();
        let index = WorkspaceIndex::discover(&tree, &WorkspaceOptions::default()).unwrap();
        let from = RepoPath::new("packages/b/src/use.ts").unwrap();
        let _ = resolve(&from, &spec, &index);
    }
}
