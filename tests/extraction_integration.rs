//! Integration tests for the full extraction pipeline.
//!
//! These tests scan the fixture project under `testdata/project` and check
//! what each extractor recovers from it.

use std::path::PathBuf;

use codeatlas::config;
use codeatlas::extract::{ComponentKind, HttpMethod, ProjectIndex, HANDLER_INLINE};
use codeatlas::{Diagnostics, Runner, SourceRegistry, SymbolKind};

fn project_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join("project")
}

/// Load the fixture config, scan the project and run every extractor.
fn run_extraction() -> (SourceRegistry, ProjectIndex, Diagnostics) {
    let root = project_path();
    let (config, path) = config::load(None, &root).expect("fixture config should load");
    assert!(path.is_some(), "fixture config should be discovered");

    let diag = Diagnostics::quiet();
    let registry = SourceRegistry::scan(&root, &config, &diag).expect("scan should succeed");
    let index = Runner::new(&config).run(&registry, &diag);
    (registry, index, diag)
}

fn symbol_line(index: &ProjectIndex, file: &str, name: &str) -> Option<usize> {
    index.symbols.get(file)?.get(name).map(|s| s.line)
}

#[test]
fn test_registry_skips_excluded_paths() {
    let (registry, index, diag) = run_extraction();

    let paths = registry.paths();
    assert!(paths.iter().all(|p| !p.starts_with("node_modules/")));
    assert!(paths.iter().all(|p| !p.starts_with("dist/")));
    assert!(paths.iter().all(|p| !p.starts_with("legacy/")));
    assert!(paths.contains(&"backend/app.py".to_string()));
    assert!(paths.contains(&"web/src/lib/Counter.svelte".to_string()));

    let mut sorted = paths.to_vec();
    sorted.sort();
    assert_eq!(paths, sorted.as_slice());

    assert_eq!(index.summary.files, paths.len());
    assert_eq!(diag.warning_count(), 0);
}

#[test]
fn test_python_symbols() {
    let (_, index, _) = run_extraction();
    let file = "backend/models.py";

    assert_eq!(symbol_line(&index, file, "@dataclass User"), Some(5));
    assert_eq!(symbol_line(&index, file, "UserRepository"), Some(10));
    assert_eq!(symbol_line(&index, file, "UserRepository.__init__"), Some(11));
    assert_eq!(symbol_line(&index, file, "@property UserRepository.count"), Some(15));
    assert_eq!(symbol_line(&index, file, "UserRepository.fetch"), Some(18));
    assert_eq!(symbol_line(&index, file, "@static UserRepository.table"), Some(22));
    assert_eq!(symbol_line(&index, file, "connect"), Some(26));

    let symbols = &index.symbols[file];
    assert_eq!(symbols.get("UserRepository.fetch").map(|s| s.kind), Some(SymbolKind::AsyncFunction));
    assert_eq!(symbols.get("connect").map(|s| s.kind), Some(SymbolKind::Function));

    // Downstream order is by line
    let lines: Vec<usize> = symbols.by_line().iter().map(|s| s.line).collect();
    let mut sorted = lines.clone();
    sorted.sort();
    assert_eq!(lines, sorted);
}

#[test]
fn test_symbols_in_other_languages() {
    let (_, index, _) = run_extraction();

    let go = &index.symbols["services/store.go"];
    assert_eq!(go.get("Store").map(|s| (s.line, s.kind)), Some((3, SymbolKind::Struct)));
    assert_eq!(go.get("Reader").map(|s| (s.line, s.kind)), Some((7, SymbolKind::Interface)));
    assert_eq!(go.get("NewStore").map(|s| (s.line, s.kind)), Some((11, SymbolKind::Function)));
    assert_eq!(go.get("Get").map(|s| (s.line, s.kind)), Some((15, SymbolKind::Method)));

    assert_eq!(symbol_line(&index, "server/orders.js", "listOrders"), Some(1));
    assert_eq!(symbol_line(&index, "server/users.service.ts", "UsersService"), Some(1));
    assert_eq!(symbol_line(&index, "server/users.service.ts", "all"), Some(2));

    let php = "app/Http/Controllers/UserController.php";
    assert_eq!(symbol_line(&index, php, "UserController"), Some(7));
    assert_eq!(symbol_line(&index, php, "show"), Some(9));
    assert_eq!(symbol_line(&index, php, "update"), Some(14));
    assert_eq!(symbol_line(&index, "app/helpers.php", "format_money"), Some(3));

    // Files without definitions do not appear at all
    assert!(!index.symbols.contains_key("backend/urls.py"));
}

#[test]
fn test_endpoints_across_frameworks() {
    let (_, index, _) = run_extraction();
    let expect = |key: &str, handler: &str, file: &str, line: usize| {
        let ep = index
            .endpoints
            .get(key)
            .unwrap_or_else(|| panic!("missing endpoint {key}"));
        assert_eq!(ep.handler, handler, "handler of {key}");
        assert_eq!(ep.file, file, "file of {key}");
        assert_eq!(ep.line, line, "line of {key}");
    };

    // Flask
    expect("GET /users", "users", "backend/app.py", 7);
    expect("POST /users", "users", "backend/app.py", 7);
    expect("GET /users/<int:user_id>", "user_detail", "backend/app.py", 12);
    // FastAPI
    expect("GET /items/{item_id}", "read_item", "backend/api.py", 6);
    expect("POST /items", "create_item", "backend/api.py", 11);
    // Django
    expect("ALL /", "views.index", "backend/urls.py", 5);
    expect("ALL /reports/<int:pk>/", "views.report_detail", "backend/urls.py", 6);
    // Express
    expect("DELETE /orders/:id", "removeOrder", "server/index.js", 6);
    expect("GET /orders", HANDLER_INLINE, "server/index.js", 10);
    // NestJS
    expect("GET api/users/", "findAll", "server/users.controller.ts", 8);
    expect("GET api/users/:id", "findOne", "server/users.controller.ts", 13);
    expect("POST api/users/", "create", "server/users.controller.ts", 18);
    // Laravel
    expect("GET /profile", "UserController@show", "routes/web.php", 6);
    expect("POST /profile", "UserController@update", "routes/web.php", 7);
    expect("ALL /health", HANDLER_INLINE, "routes/web.php", 8);

    assert_eq!(index.endpoints.len(), 15);
    assert_eq!(index.endpoints["ALL /health"].method, HttpMethod::All);
    assert!(!index.endpoints.contains_key("GET /legacy"));
    assert!(!index.endpoints.contains_key("GET /bundled"));
}

#[test]
fn test_components() {
    let (_, index, _) = run_extraction();

    let card = &index.components["UserCard"];
    assert_eq!(card.kind, ComponentKind::Vue);
    assert_eq!(card.line, 9);
    assert_eq!(card.props, vec!["user", "compact"]);
    assert_eq!(card.emits, vec!["select"]);
    assert_eq!(card.api_calls, vec!["/api/users/me"]);

    let app = &index.components["App"];
    assert_eq!(app.kind, ComponentKind::React);
    assert_eq!(app.line, 9);
    assert_eq!(app.props, vec!["title", "initialCount"]);
    assert_eq!(app.hooks, vec!["useState", "useEffect"]);
    assert_eq!(app.api_calls, vec!["/api/users"]);

    let header = &index.components["Header"];
    assert_eq!(header.line, 17);
    assert!(header.props.is_empty());

    let counter = &index.components["Counter"];
    assert_eq!(counter.kind, ComponentKind::Svelte);
    assert_eq!(counter.props, vec!["start", "step"]);
    assert_eq!(counter.emits, vec!["change"]);

    assert_eq!(index.components.len(), 4);
}

#[test]
fn test_dependencies() {
    let (_, index, _) = run_extraction();
    let deps = |file: &str| -> Vec<String> {
        index
            .dependencies
            .get(file)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    };

    assert_eq!(deps("backend/app.py"), vec!["backend/models.py"]);
    assert_eq!(deps("server/index.js"), vec!["server/orders.js"]);
    assert_eq!(deps("server/users.controller.ts"), vec!["server/users.service.ts"]);
    assert_eq!(deps("web/src/App.tsx"), vec!["web/src/utils/format.js"]);
    assert_eq!(deps("web/src/components/UserCard.vue"), vec!["web/src/utils/format.js"]);
    assert_eq!(deps("routes/web.php"), vec!["app/Http/Controllers/UserController.php"]);
    assert_eq!(
        deps("app/Http/Controllers/UserController.php"),
        vec!["app/Models/User.php", "app/helpers.php"]
    );

    // Only external imports, or none at all
    for file in ["backend/api.py", "backend/urls.py", "backend/models.py", "web/src/lib/Counter.svelte"] {
        assert!(!index.dependencies.contains_key(file), "{file} should have no edges");
    }
    for (source, targets) in &index.dependencies {
        assert!(!targets.contains(source), "{source} depends on itself");
        assert!(!targets.is_empty());
    }
}

#[test]
fn test_extraction_is_idempotent() {
    let (_, first, _) = run_extraction();
    let (_, second, _) = run_extraction();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_parallel_run_matches_sequential() {
    let root = project_path();
    let (config, _) = config::load(None, &root).unwrap();
    let diag = Diagnostics::quiet();
    let registry = SourceRegistry::scan(&root, &config, &diag).unwrap();

    let sequential = Runner::new(&config).parallel(false).run(&registry, &diag);
    let parallel = Runner::new(&config).parallel(true).run(&registry, &diag);
    assert_eq!(
        serde_json::to_string(&sequential).unwrap(),
        serde_json::to_string(&parallel).unwrap()
    );
}

#[test]
fn test_without_config_legacy_is_indexed() {
    let root = project_path();
    let diag = Diagnostics::quiet();
    let registry = SourceRegistry::scan(&root, &config::Config::default(), &diag).unwrap();
    let index = Runner::default().run(&registry, &diag);

    assert_eq!(index.endpoints["GET /legacy"].handler, "old");
}

#[test]
fn test_stack_detection() {
    let (_, index, _) = run_extraction();
    let stack = &index.summary.frameworks;

    assert_eq!(
        stack.backend,
        vec!["Python (pip)", "Express", "Flask", "FastAPI", "Django"]
    );
    assert_eq!(stack.frontend, vec!["Node.js", "React", "Vue 3"]);
    assert_eq!(stack.other, vec!["Docker"]);

    let monorepo = index.summary.monorepo.as_ref().expect("workspaces should be detected");
    assert_eq!(monorepo.tool, "npm/yarn workspaces");
    assert_eq!(monorepo.workspaces, vec!["server", "web"]);
}

#[test]
fn test_file_map_covers_every_tracked_file() {
    let (registry, index, _) = run_extraction();
    let file_map = &index.summary.file_map;

    let mapped: Vec<&String> = file_map.keys().collect();
    let tracked: Vec<&String> = registry.paths().iter().collect();
    assert_eq!(mapped, tracked);

    let models = &file_map["backend/models.py"];
    assert_eq!((models.language.as_str(), models.lines), ("py", 27));
    assert_eq!(file_map["package.json"].language, "json");
    assert!(!file_map.contains_key("Dockerfile"));
}
