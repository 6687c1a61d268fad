//! Language detection and binding-point pattern tables.
//!
//! Language support is table-driven: an extension→language lookup plus, per
//! language, an ordered list of `(category, pattern)` pairs. Adding a
//! language means adding table entries, not new types.
//!
//! The patterns are deliberately shallow — they match single source lines,
//! not parsed syntax, so false positives and negatives are expected. A
//! pattern with multiple capture groups expresses either/or alternatives
//! (`import X` vs `require(Y)`); the extractor takes the first non-empty
//! group as the match name.

use regex::Regex;

/// Category name under which raw import strings are collected.
pub const IMPORT_CATEGORY: &str = "imports";

/// Map a lowercase file extension (with leading dot) to its language tag.
///
/// Files whose extension is not listed here are skipped entirely during
/// discovery.
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let lang = match ext {
        ".py" => "python",
        ".js" | ".jsx" | ".vue" | ".svelte" => "javascript",
        ".ts" | ".tsx" => "typescript",
        ".swift" => "swift",
        ".m" => "objc",
        ".rs" => "rust",
        ".go" => "go",
        ".rb" => "ruby",
        ".java" => "java",
        ".kt" => "kotlin",
        ".c" | ".h" => "c",
        ".cpp" | ".hpp" => "cpp",
        ".cs" => "c_sharp",
        ".dart" => "dart",
        ".php" => "php",
        ".lua" => "lua",
        _ => return None,
    };
    Some(lang)
}

/// Ordered `(category, pattern)` table for a language.
///
/// A language with no table entry (e.g. `c`, `lua`) produces no binding
/// points; that is not an error.
pub fn binding_patterns(language: &str) -> &'static [(&'static str, &'static str)] {
    match language {
        "swift" => &[
            ("protocols", r"protocol\s+(\w+)"),
            ("delegates", r"(\w+Delegate|\w+DataSource)"),
            (
                "notifications",
                r"NotificationCenter\.\w+\.\w+\(.*?name:\s*[.\w]*(\w+)",
            ),
            ("core_data", r"@FetchRequest|NSManagedObject|NSPersistentContainer"),
            (
                "combine",
                r"@Published|PassthroughSubject|CurrentValueSubject|\.sink\b",
            ),
            (
                "swiftui_env",
                r"@Environment|@EnvironmentObject|@StateObject|@ObservedObject|@AppStorage",
            ),
            (
                "api_calls",
                r"URLSession|URLRequest|\.dataTask|async\s+let|try\s+await",
            ),
            ("keychain", r"Keychain|SecItem|kSecClass"),
            ("userdefaults", r"UserDefaults\.\w+"),
        ],
        "python" => &[
            ("imports", r"^(?:from\s+(\S+)\s+import|import\s+(\S+))"),
            ("decorators", r"@(\w+)"),
            ("api_endpoints", r#"@(?:app|router|api)\.\w+\(\s*['"]([^'"]+)"#),
            ("db_models", r"class\s+\w+\(.*(?:Model|Base|db\.Model)"),
            ("env_vars", r#"os\.(?:environ|getenv)\s*[\[\(]\s*['"](\w+)"#),
            ("signals", r"\.connect\(|signal\(|@receiver"),
        ],
        "javascript" => &[
            (
                "imports",
                r#"(?:import\s+.*?from\s+['"]([^'"]+)|require\s*\(\s*['"]([^'"]+))"#,
            ),
            (
                "exports",
                r"(?:export\s+(?:default\s+)?(?:class|function|const|let|var)\s+(\w+)|module\.exports)",
            ),
            (
                "api_routes",
                r#"(?:app|router)\.\s*(get|post|put|delete|patch)\s*\(\s*['"]([^'"]+)"#,
            ),
            (
                "event_emitters",
                r#"\.on\s*\(\s*['"](\w+)|\.emit\s*\(\s*['"](\w+)"#,
            ),
            ("env_vars", r"process\.env\.(\w+)"),
            ("hooks", r"use[A-Z]\w+"),
            ("context", r"createContext|useContext|\.Provider"),
        ],
        "typescript" => &[
            (
                "imports",
                r#"(?:import\s+.*?from\s+['"]([^'"]+)|require\s*\(\s*['"]([^'"]+))"#,
            ),
            (
                "exports",
                r"(?:export\s+(?:default\s+)?(?:class|function|const|let|var|interface|type|enum)\s+(\w+))",
            ),
            ("interfaces", r"interface\s+(\w+)"),
            (
                "api_routes",
                r#"(?:app|router)\.\s*(get|post|put|delete|patch)\s*\(\s*['"]([^'"]+)"#,
            ),
            ("decorators", r"@(\w+)"),
            ("env_vars", r"process\.env\.(\w+)"),
        ],
        "rust" => &[
            ("imports", r"use\s+([\w:]+)"),
            ("traits", r"trait\s+(\w+)"),
            ("unsafe", r"unsafe\s+\{"),
            ("ffi", r#"extern\s+"C""#),
        ],
        "go" => &[
            ("imports", r#"import\s+(?:\(\s*)?["\s]*([^"\s\)]+)"#),
            ("interfaces", r"type\s+(\w+)\s+interface"),
            ("goroutines", r"go\s+\w+"),
            ("http_handlers", r#"http\.Handle(?:Func)?\s*\(\s*['"]([^'"]+)"#),
        ],
        "java" => &[
            ("imports", r"import\s+([\w.]+)"),
            ("interfaces", r"interface\s+(\w+)"),
            ("annotations", r"@(\w+)"),
            (
                "spring_endpoints",
                r#"@(?:Get|Post|Put|Delete|Patch|Request)Mapping\s*\(\s*['"]?([^'")\s]+)"#,
            ),
        ],
        "kotlin" => &[
            ("imports", r"import\s+([\w.]+)"),
            ("annotations", r"@(\w+)"),
            ("coroutines", r"(?:launch|async|withContext|suspend\s+fun)"),
        ],
        "c_sharp" => &[
            ("imports", r"using\s+([\w.]+)"),
            ("interfaces", r"interface\s+(\w+)"),
            ("attributes", r"\[(\w+)"),
        ],
        "ruby" => &[
            ("imports", r#"require\s+['"]([^'"]+)"#),
            ("routes", r#"(?:get|post|put|delete|patch)\s+['"]([^'"]+)"#),
        ],
        "dart" => &[
            ("imports", r#"import\s+['"]([^'"]+)"#),
            ("providers", r"Provider|ChangeNotifier|Riverpod|Bloc"),
        ],
        "php" => &[
            ("imports", r#"(?:use|require|include)(?:_once)?\s+['"]?([^'";\s]+)"#),
            ("routes", r#"Route::\w+\(\s*['"]([^'"]+)"#),
        ],
        _ => &[],
    }
}

/// Compile a language's pattern table.
///
/// A pattern that fails to compile is skipped for that language without
/// aborting the file or the scan.
pub fn compiled_patterns(language: &str) -> Vec<(&'static str, Regex)> {
    binding_patterns(language)
        .iter()
        .filter_map(|(category, source)| Regex::new(source).ok().map(|re| (*category, re)))
        .collect()
}
