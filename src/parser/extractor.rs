//! Route declarations from one Go file.
//!
//! The walker follows Go's block structure so that router variables bound to a
//! group prefix only apply where they are in scope.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use tree_sitter::{Node, Parser, Tree};

use super::comments::CommentIndex;
use super::handlers::{collect_handlers, HandlerInfo};
use super::helpers::{call_arg, field_children, line_of, named_children, node_text, param_names};
use super::scope::PrefixScopes;
use super::structs::{collect_structs, StructDef};
use crate::error::{Result, RouteError};
use crate::routes::conventions::links_prefix;
use crate::routes::{match_call_site, CallArg, CallLink, CallSite, RawDeclaration, SourcePosition};

/// Everything pulled out of one Go source file.
#[derive(Debug, Clone, Default)]
pub struct FileExtraction {
    pub file_path: PathBuf,
    /// Route declarations in source order.
    pub declarations: Vec<RawDeclaration>,
    pub handlers: Vec<HandlerInfo>,
    pub structs: Vec<StructDef>,
    /// Call sites skipped because their syntax contained errors.
    pub error_sites: usize,
}

pub fn is_go_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("go")
}

/// Parse Go source into a syntax tree.
pub fn parse_go(path: &Path, source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| RouteError::ParserInit(e.to_string()))?;

    parser
        .parse(source, None)
        .ok_or_else(|| RouteError::ParseFailed(path.to_path_buf()))
}

/// Extract route declarations, handler functions and struct types from a
/// Go source file.
pub fn extract_file(path: &Path, source: &str) -> Result<FileExtraction> {
    if !is_go_file(path) {
        return Err(RouteError::UnsupportedFile(path.to_path_buf()));
    }

    let tree = parse_go(path, source)?;
    let root = tree.root_node();
    let bytes = source.as_bytes();
    let comments = CommentIndex::build(&root, bytes);

    let mut walker = Walker {
        path,
        source: bytes,
        comments: &comments,
        scopes: PrefixScopes::new(),
        closure_prefixes: HashMap::new(),
        declarations: Vec::new(),
        error_sites: 0,
    };
    walker.visit(&root);

    let extraction = FileExtraction {
        file_path: path.to_path_buf(),
        declarations: walker.declarations,
        handlers: collect_handlers(&root, bytes, &comments, path),
        structs: collect_structs(&root, bytes),
        error_sites: walker.error_sites,
    };
    debug!(
        file = %path.display(),
        routes = extraction.declarations.len(),
        handlers = extraction.handlers.len(),
        error_sites = extraction.error_sites,
        "extracted"
    );
    Ok(extraction)
}

/// Depth-first walk that keeps router prefixes in lexical scope and turns
/// every call chain into a [`CallSite`].
struct Walker<'a> {
    path: &'a Path,
    source: &'a [u8],
    comments: &'a CommentIndex,
    scopes: PrefixScopes,
    /// Prefix for the first parameter of a closure passed to
    /// `Route("/p", func(r chi.Router) {...})`, keyed by the closure's node id.
    closure_prefixes: HashMap<usize, String>,
    declarations: Vec<RawDeclaration>,
    error_sites: usize,
}

impl<'a> Walker<'a> {
    fn visit(&mut self, node: &Node) {
        match node.kind() {
            "function_declaration" | "method_declaration" | "func_literal" => {
                self.scopes.push();
                self.bind_params(node);
                self.visit_children(node);
                self.scopes.pop();
            }
            "block" => {
                self.scopes.push();
                self.visit_children(node);
                self.scopes.pop();
            }
            "short_var_declaration" => self.visit_binding(node, "left", "right", true),
            "assignment_statement" => self.visit_binding(node, "left", "right", false),
            "var_spec" => self.visit_var_spec(node),
            "call_expression" => {
                if is_chain_head(node) {
                    self.visit_call(node);
                }
                self.visit_children(node);
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: &Node) {
        for i in 0..node.named_child_count() {
            if let Some(child) = node.named_child(i) {
                self.visit(&child);
            }
        }
    }

    fn bind_params(&mut self, func: &Node) {
        let prefix = self.closure_prefixes.remove(&func.id());
        let names = param_names(func, self.source);
        for (i, name) in names.iter().enumerate() {
            let bound = match (&prefix, i) {
                (Some(p), 0) => p.clone(),
                _ => String::new(),
            };
            self.scopes.bind(name, bound);
        }
    }

    /// `x := expr` or `x = expr`. The right side is walked first so that
    /// closures in it see the outer bindings.
    fn visit_binding(&mut self, node: &Node, left: &str, right: &str, declare: bool) {
        let rhs = node
            .child_by_field_name(right)
            .map(|r| named_children(&r))
            .unwrap_or_default();
        for value in &rhs {
            self.visit(value);
        }

        let Some(lhs) = node.child_by_field_name(left) else {
            return;
        };
        for (i, target) in named_children(&lhs).iter().enumerate() {
            let prefix = rhs
                .get(i)
                .map(|v| self.expr_prefix(v))
                .unwrap_or_default();
            let name = node_text(target, self.source);
            if declare {
                self.scopes.bind(&name, prefix);
            } else {
                self.scopes.assign(&name, prefix);
            }
        }
    }

    fn visit_var_spec(&mut self, spec: &Node) {
        let values = spec
            .child_by_field_name("value")
            .map(|v| named_children(&v))
            .unwrap_or_default();
        for value in &values {
            self.visit(value);
        }
        for (i, name) in field_children(spec, "name").iter().enumerate() {
            let prefix = values
                .get(i)
                .map(|v| self.expr_prefix(v))
                .unwrap_or_default();
            self.scopes.bind(&node_text(name, self.source), prefix);
        }
    }

    /// Prefix an expression carries when assigned to a variable.
    fn expr_prefix(&self, expr: &Node) -> String {
        match expr.kind() {
            "identifier" | "selector_expression" => {
                self.scopes.prefix_of(&node_text(expr, self.source))
            }
            "call_expression" => match self.chain(expr) {
                Some((base, links)) => links_prefix(&self.base_prefix(base.as_deref()), &links),
                None => String::new(),
            },
            "parenthesized_expression" | "unary_expression" => named_children(expr)
                .last()
                .map(|inner| self.expr_prefix(inner))
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn base_prefix(&self, base: Option<&str>) -> String {
        base.map(|b| self.scopes.prefix_of(b)).unwrap_or_default()
    }

    /// Flatten `a.B(x).C(y)` into base `a` and links `B(x)`, `C(y)`.
    fn chain(&self, call: &Node) -> Option<(Option<String>, Vec<CallLink>)> {
        let function = call.child_by_field_name("function")?;
        let args: Vec<CallArg> = call
            .child_by_field_name("arguments")
            .map(|a| {
                named_children(&a)
                    .iter()
                    .map(|arg| call_arg(arg, self.source))
                    .collect()
            })
            .unwrap_or_default();

        match function.kind() {
            "selector_expression" => {
                let operand = function.child_by_field_name("operand")?;
                let member = node_text(&function.child_by_field_name("field")?, self.source);
                let link = CallLink::new(member, args);
                if operand.kind() == "call_expression" {
                    let (base, mut links) = self.chain(&operand)?;
                    links.push(link);
                    Some((base, links))
                } else {
                    Some((Some(node_text(&operand, self.source)), vec![link]))
                }
            }
            "identifier" => Some((None, vec![CallLink::new(node_text(&function, self.source), args)])),
            _ => None,
        }
    }

    fn visit_call(&mut self, call: &Node) {
        if call.has_error() {
            self.error_sites += 1;
            trace!(file = %self.path.display(), line = line_of(call), "skipping call with syntax errors");
            return;
        }
        let Some((base, links)) = self.chain(call) else {
            return;
        };

        let site = CallSite {
            base_prefix: self.base_prefix(base.as_deref()),
            base,
            links,
            position: SourcePosition::new(self.path, line_of(call)),
            comment: self
                .comments
                .describe(call.start_position().row, call.end_position().row),
        };

        self.note_closure_scope(call, &site);
        self.declarations.extend(match_call_site(&site));
    }

    /// `r.Route("/p", func(r chi.Router) {...})` and `r.Group(func(r chi.Router) {...})`
    /// hand the closure a router already scoped to the chain's prefix.
    fn note_closure_scope(&mut self, call: &Node, site: &CallSite) {
        let Some(link) = site.last() else {
            return;
        };
        if !matches!(link.member.as_str(), "Route" | "Group" | "Mount") {
            return;
        }
        let Some(closure_idx) = link
            .args
            .iter()
            .position(|a| matches!(a, CallArg::FuncLit { .. }))
        else {
            return;
        };
        let Some(closure) = call
            .child_by_field_name("arguments")
            .and_then(|a| named_children(&a).into_iter().nth(closure_idx))
        else {
            return;
        };
        self.closure_prefixes.insert(closure.id(), site.chain_prefix());
    }
}

/// Whether `call` is the outermost call of its chain. Inner links
/// (`r.Group("/api")` in `r.Group("/api").GET(...)`) are read through the head.
fn is_chain_head(call: &Node) -> bool {
    let Some(parent) = call.parent() else {
        return true;
    };
    if parent.kind() != "selector_expression" {
        return true;
    }
    let is_operand = parent
        .child_by_field_name("operand")
        .is_some_and(|op| op.id() == call.id());
    let called = parent.parent().is_some_and(|gp| {
        gp.kind() == "call_expression"
            && gp
                .child_by_field_name("function")
                .is_some_and(|f| f.id() == parent.id())
    });
    !(is_operand && called)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::Convention;

    fn extract(src: &str) -> FileExtraction {
        extract_file(Path::new("main.go"), src).unwrap()
    }

    fn routes(src: &str) -> Vec<(String, String)> {
        extract(src)
            .declarations
            .into_iter()
            .map(|d| (d.method, d.path))
            .collect()
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(m, p)| (m.to_string(), p.to_string()))
            .collect()
    }

    #[test]
    fn test_rejects_non_go() {
        let err = extract_file(Path::new("main.rs"), "fn main() {}").unwrap_err();
        assert!(matches!(err, RouteError::UnsupportedFile(_)));
    }

    #[test]
    fn test_net_http() {
        let src = r#"package main

import "net/http"

// Health check endpoint
func main() {
	// List every user
	http.HandleFunc("/users", getUsers)
	http.Handle("/static/", fileServer)
	http.ListenAndServe(":8080", nil)
}
"#;
        let ex = extract(src);
        assert_eq!(ex.declarations.len(), 2);
        let first = &ex.declarations[0];
        assert_eq!(first.method, "GET");
        assert_eq!(first.path, "/users");
        assert_eq!(first.handler, "getUsers");
        assert_eq!(first.comment.as_deref(), Some("List every user"));
        assert_eq!(first.position.line, 8);
        assert_eq!(first.convention, Convention::DirectHandler);
        assert_eq!(ex.declarations[1].comment, None);
    }

    #[test]
    fn test_methods_list_expands() {
        let src = r#"package main

func main() {
	r := mux.NewRouter()
	r.HandleFunc("/posts", handlePosts).Methods("GET", "POST")
}
"#;
        assert_eq!(routes(src), pairs(&[("GET", "/posts"), ("POST", "/posts")]));
    }

    #[test]
    fn test_method_constants() {
        let src = r#"package main

func main() {
	r := mux.NewRouter()
	r.HandleFunc("/items", handleItems).Methods(http.MethodGet, http.MethodPost)

	c := chi.NewRouter()
	c.Method(http.MethodPut, "/x", putX)
}
"#;
        let ex = extract(src);
        assert_eq!(
            routes(src),
            pairs(&[("GET", "/items"), ("POST", "/items"), ("PUT", "/x")])
        );
        assert_eq!(ex.declarations[2].handler, "putX");
        assert_eq!(ex.declarations[2].convention, Convention::ExplicitMethod);
    }

    #[test]
    fn test_echo_route_middleware_after_handler() {
        let src = r#"package main

func main() {
	e := echo.New()
	e.GET("/users", getUsers, authMiddleware)
	r := gin.Default()
	r.GET("/admin", authRequired(), adminHome)
}
"#;
        let handlers: Vec<String> = extract(src)
            .declarations
            .into_iter()
            .map(|d| d.handler)
            .collect();
        assert_eq!(handlers, vec!["getUsers", "adminHome"]);
    }

    #[test]
    fn test_commented_out_route_ignored() {
        let src = r#"package main

func main() {
	// router.GET("/ignored", h)
	/* router.POST("/also-ignored", h) */
	log.Println("router.GET(\"/not-a-route\", h)")
}
"#;
        assert!(extract(src).declarations.is_empty());
    }

    #[test]
    fn test_gin_group_block() {
        let src = r#"package main

func setup(router *gin.Engine) {
	v1 := router.Group("/api/v1")
	{
		v1.GET("/users", listUsers)
		v1.POST("/users", createUser)
	}
	router.GET("/health", health)
}
"#;
        assert_eq!(
            routes(src),
            pairs(&[
                ("GET", "/api/v1/users"),
                ("POST", "/api/v1/users"),
                ("GET", "/health"),
            ])
        );
    }

    #[test]
    fn test_mux_subrouter_prefix() {
        let src = r#"package main

func routes() {
	r := mux.NewRouter()
	api := r.PathPrefix("/api").Subrouter()
	v1 := api.PathPrefix("/v1").Subrouter()
	v1.HandleFunc("/items/{id}", getItem).Methods("GET")
	r.Path("/articles/{slug}").HandlerFunc(getArticle).Methods("GET")
}
"#;
        assert_eq!(
            routes(src),
            pairs(&[("GET", "/api/v1/items/{id}"), ("GET", "/articles/{slug}")])
        );
    }

    #[test]
    fn test_chained_group() {
        let src = r#"package main

func main() {
	e := echo.New()
	e.Group("/admin").GET("/stats", stats)
	e.Add("PATCH", "/users/:id", patchUser)
}
"#;
        let ex = extract(src);
        assert_eq!(
            ex.declarations
                .iter()
                .map(|d| (d.method.as_str(), d.path.as_str()))
                .collect::<Vec<_>>(),
            vec![("GET", "/admin/stats"), ("PATCH", "/users/:id")]
        );
        assert_eq!(ex.declarations[1].convention, Convention::ExplicitMethod);
    }

    #[test]
    fn test_chi_route_closure() {
        let src = r#"package main

func main() {
	r := chi.NewRouter()
	r.Route("/articles", func(r chi.Router) {
		r.Get("/", listArticles)
		r.Route("/{articleID}", func(r chi.Router) {
			r.Put("/", updateArticle)
		})
	})
	r.Group(func(r chi.Router) {
		r.Post("/login", login)
	})
	r.Get("/ping", ping)
}
"#;
        assert_eq!(
            routes(src),
            pairs(&[
                ("GET", "/articles/"),
                ("PUT", "/articles/{articleID}/"),
                ("POST", "/login"),
                ("GET", "/ping"),
            ])
        );
    }

    #[test]
    fn test_scope_does_not_leak() {
        let src = r#"package main

func a(r *gin.Engine) {
	if true {
		r := r.Group("/inner")
		r.GET("/x", x)
	}
	r.GET("/y", y)
}

func b(r *gin.Engine) {
	r.GET("/z", z)
}
"#;
        assert_eq!(
            routes(src),
            pairs(&[("GET", "/inner/x"), ("GET", "/y"), ("GET", "/z")])
        );
    }

    #[test]
    fn test_http_client_calls_ignored() {
        let src = r#"package main

func fetch() {
	resp, _ := http.Get("http://example.com/users")
	client.Post("/upload", "application/json", body)
	r.Get("/real", realHandler)
}
"#;
        assert_eq!(routes(src), pairs(&[("GET", "/real")]));
    }

    #[test]
    fn test_trailing_comment_and_func_literal() {
        let src = r#"package main

func main() {
	r.GET("/ping", func(c *gin.Context) { // liveness probe
		c.String(200, "pong")
	})
	mux.HandleFunc("DELETE /items/{id}", deleteItem) // remove an item
}
"#;
        let ex = extract(src);
        assert_eq!(ex.declarations.len(), 2);
        assert_eq!(ex.declarations[0].handler, "func literal");
        assert_eq!(ex.declarations[0].comment, None);
        assert_eq!(ex.declarations[1].method, "DELETE");
        assert_eq!(ex.declarations[1].path, "/items/{id}");
        assert_eq!(ex.declarations[1].comment.as_deref(), Some("remove an item"));
    }

    #[test]
    fn test_package_level_router() {
        let src = r#"package main

var api = router.Group("/api")

func init() {
	api.GET("/status", status)
}
"#;
        assert_eq!(routes(src), pairs(&[("GET", "/api/status")]));
    }

    #[test]
    fn test_syntax_error_site_skipped() {
        let src = r#"package main

func main() {
	r.GET("/ok", ok)
	r.GET("/broken" broken)
}
"#;
        let ex = extract(src);
        assert!(ex.declarations.iter().any(|d| d.path == "/ok"));
        assert!(ex.declarations.iter().all(|d| d.path != "/broken"));
    }
}
