use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use codespan_reporting::term::termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use serde::Deserialize;
use tracing::debug;

use pages::{PageData, PageError, SystemVariableSource, UrlPathVariableSource, WikiPage, WikitextPage};
use wikitext::VariableSource;

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Full name the test body is stored under. Defaults to "TestPage".
    #[serde(default = "default_page")]
    pub page: String,

    /// Other pages of the tree, by full name. Missing ancestors are created empty.
    #[serde(default)]
    pub pages: BTreeMap<String, String>,

    /// Variables known to the host.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    /// Variables passed on the request URL.
    #[serde(default)]
    pub url_variables: BTreeMap<String, String>,

    /// Expected HTML of the test page (trimmed comparison).
    #[serde(default)]
    pub expect_html: Option<String>,

    /// Substrings the HTML must contain.
    #[serde(default)]
    pub expect_contains: Vec<String>,

    /// Expected rendered variable values, as seen from the test page.
    #[serde(default)]
    pub expect_variable: BTreeMap<String, String>,

    /// If true, the test expects the test page not to parse.
    #[serde(default)]
    pub expect_parse_error: bool,
}

fn default_page() -> String {
    "TestPage".to_string()
}

/// Parse a `.test.wiki` file into its TOML config and page markup.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest_start = close_pos + 4; // skip \n---
    let source = after_open[rest_start..]
        .strip_prefix("\r\n")
        .or_else(|| after_open[rest_start..].strip_prefix('\n'))
        .unwrap_or(&after_open[rest_start..]);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

/// The tree a test runs against. Pages hold their parents weakly, so the
/// root is kept here for as long as the test page is used.
struct TestTree {
    _root: Arc<WikitextPage>,
    page: Arc<WikitextPage>,
}

/// Build the page tree described by `config`, with `source` as the test page.
fn build_tree(config: &TestConfig, source: &str) -> Result<TestTree, String> {
    let system = config.variables.iter().fold(
        SystemVariableSource::new().without_environment(),
        |host, (name, value)| host.with_property(name, value),
    );
    let url: HashMap<String, String> = config
        .url_variables
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let host: Arc<dyn VariableSource> = Arc::new(UrlPathVariableSource::new(Arc::new(system), url));

    let root = WikitextPage::root("Root", PageData::default(), host);
    let mut created: HashMap<String, Arc<WikitextPage>> = HashMap::new();

    let mut contents = config.pages.clone();
    contents.insert(config.page.clone(), source.to_string());

    for (full_name, content) in &contents {
        let mut current = root.clone();
        let mut name_so_far = String::new();
        for name in full_name.trim_start_matches('.').split('.') {
            if name.is_empty() {
                return Err(format!("invalid page name '{}'", full_name));
            }
            if !name_so_far.is_empty() {
                name_so_far.push('.');
            }
            name_so_far.push_str(name);
            current = created
                .entry(name_so_far.clone())
                .or_insert_with(|| WikitextPage::child_of(&current, name, PageData::default()))
                .clone();
        }
        current.commit(PageData::new(content.as_str()));
    }

    let page = created
        .remove(config.page.trim_start_matches('.'))
        .ok_or_else(|| format!("invalid page name '{}'", config.page))?;
    Ok(TestTree { _root: root, page })
}

/// Run one `.test.wiki` file.
pub fn run_test_file(path: &Path) -> TestResult {
    debug!(path = %path.display(), "running test");

    // 1. Read file
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("cannot read file: {}", e)),
            };
        }
    };

    // 2. Parse frontmatter
    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("frontmatter error: {}", e)),
            };
        }
    };

    let description = config.description.clone();
    let outcome = match check(&config, source) {
        Ok(()) => TestOutcome::Pass,
        Err(reason) => TestOutcome::Fail(reason),
    };

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Render the test page and compare against every expectation.
fn check(config: &TestConfig, source: &str) -> Result<(), String> {
    let tree = build_tree(config, source)?;
    let page = &tree.page;

    // 3. Render, handling expect_parse_error
    let html = match (page.html(), config.expect_parse_error) {
        (Err(PageError::Parse { .. }), true) => return Ok(()),
        (Ok(_), true) => return Err("expected parse error, but parsing succeeded".into()),
        (Err(PageError::Parse { errors, .. }), false) => {
            let msgs: Vec<String> = errors.iter().map(|e| e.message.clone()).collect();
            return Err(format!("unexpected parse error: {}", msgs.join("; ")));
        }
        (Err(other), _) => return Err(format!("render failed: {}", other)),
        (Ok(html), false) => html,
    };

    // 4. Check HTML expectations
    if let Some(expected) = &config.expect_html {
        let (expected, actual) = (expected.trim(), html.trim());
        if expected != actual {
            return Err(format!(
                "html mismatch\n  expected: {}\n  actual:   {}",
                expected, actual
            ));
        }
    }
    for needle in &config.expect_contains {
        if !html.contains(needle.as_str()) {
            return Err(format!(
                "expected html containing \"{}\", got: {}",
                needle,
                html.trim()
            ));
        }
    }

    // 5. Check variables
    for (name, expected) in &config.expect_variable {
        match page.variable(name) {
            Ok(Some(actual)) if actual == *expected => {}
            Ok(Some(actual)) => {
                return Err(format!(
                    "variable {}: expected \"{}\", got \"{}\"",
                    name, expected, actual
                ));
            }
            Ok(None) => return Err(format!("variable {}: expected \"{}\", but it is undefined", name, expected)),
            Err(e) => return Err(format!("variable {}: {}", name, e)),
        }
    }

    Ok(())
}

/// `.test.wiki` files under `root` grouped by category, the directory they
/// sit in relative to `root`. A single file is its own uncategorized group.
fn discover(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut found: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    if root.is_file() {
        found.insert(String::new(), vec![root.to_path_buf()]);
        return found;
    }
    collect_tests(root, root, &mut found);
    for files in found.values_mut() {
        files.sort();
    }
    found
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if path.to_str().is_some_and(|p| p.ends_with(TEST_SUFFIX)) {
            let category = dir
                .strip_prefix(root)
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

const TEST_SUFFIX: &str = ".test.wiki";

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List the categories found under `path`.
pub fn list_categories(path: &Path) {
    let categories = discover(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return;
    }
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

fn label_of(result: &TestResult) -> &str {
    result.description.as_deref().unwrap_or_else(|| {
        result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_suffix(TEST_SUFFIX))
            .unwrap_or("?")
    })
}

fn styled(out: &mut StandardStream, spec: &ColorSpec, text: &str) {
    let _ = out.set_color(spec);
    let _ = write!(out, "{}", text);
    let _ = out.reset();
}

fn colored(color: Color) -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color));
    spec
}

/// Run every test under `path` (a directory or a single file), restricted
/// to `categories` when any are given. Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let mut found = discover(path);
    if !categories.is_empty() {
        found.retain(|category, _| categories.iter().any(|c| c.trim_matches('/') == category));
    }
    if found.is_empty() {
        eprintln!("no matching {} files in {}", TEST_SUFFIX, path.display());
        return 1;
    }

    let choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let mut out = StandardStream::stderr(choice);
    let mut bold = ColorSpec::new();
    bold.set_bold(true);

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (category, files) in &found {
        let _ = writeln!(out);
        styled(&mut out, &bold, category_label(category));
        let _ = writeln!(out);

        for file in files {
            let result = run_test_file(file);
            let _ = write!(out, "  ");
            match result.outcome {
                TestOutcome::Pass => {
                    styled(&mut out, &colored(Color::Green), "PASS");
                    passed += 1;
                }
                TestOutcome::Fail(_) => styled(&mut out, &colored(Color::Red), "FAIL"),
            }
            let _ = writeln!(out, "  {}", label_of(&result));
            if matches!(result.outcome, TestOutcome::Fail(_)) {
                failures.push(result);
            }
        }
    }

    if !failures.is_empty() {
        let _ = writeln!(out, "\nfailures:");
        for failure in &failures {
            let _ = writeln!(out, "\n  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    let _ = writeln!(out, "  {}", line);
                }
            }
        }
    }

    let _ = write!(out, "\ntest result: ");
    let code = if failures.is_empty() {
        styled(&mut out, &colored(Color::Green), "ok");
        0
    } else {
        styled(&mut out, &colored(Color::Red), "FAILED");
        1
    };
    let _ = writeln!(
        out,
        ". {} passed, {} failed (of {})",
        passed,
        failures.len(),
        passed + failures.len()
    );
    code
}
