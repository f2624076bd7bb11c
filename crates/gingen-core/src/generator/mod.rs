//! Model-to-source emission engine.
//!
//! Drives a fixed set of embedded Tera templates against a parsed
//! [`GinTemplate`] and its resolved paths. Core files (`types.go`,
//! `service.go`, `handlers.go`, `ginutil.go`) are regenerated
//! unconditionally; per-service and per-middleware stubs are skipped when
//! they already exist, so repeated runs never clobber hand-written code.

mod context;
mod routes;

use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};
use tokio::fs;

use crate::error::Result;
use crate::model::GinTemplate;
use crate::resolver::ResolvedPaths;
use crate::util::title;

const MACROS_TEMPLATE: &str = include_str!("../templates/macros.tera");
const TYPES_TEMPLATE: &str = include_str!("../templates/types.go.tera");
const SERVICE_TEMPLATE: &str = include_str!("../templates/service.go.tera");
const HANDLERS_TEMPLATE: &str = include_str!("../templates/handlers.go.tera");
const GINUTIL_TEMPLATE: &str = include_str!("../templates/ginutil.go.tera");
const SERVICE_IMPL_TEMPLATE: &str = include_str!("../templates/service_impl.go.tera");
const MIDDLEWARE_IMPL_TEMPLATE: &str = include_str!("../templates/middleware_impl.go.tera");

/// Emits the generated source files for one parsed template.
pub struct CodeGenerator<'a> {
    template: &'a GinTemplate,
    paths: ResolvedPaths,
    tera: Tera,
}

impl<'a> CodeGenerator<'a> {
    /// Build a generator over a parsed template and its resolved paths.
    pub fn new(template: &'a GinTemplate, paths: ResolvedPaths) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("macros.tera", MACROS_TEMPLATE),
            ("types.go.tera", TYPES_TEMPLATE),
            ("service.go.tera", SERVICE_TEMPLATE),
            ("handlers.go.tera", HANDLERS_TEMPLATE),
            ("ginutil.go.tera", GINUTIL_TEMPLATE),
            ("service_impl.go.tera", SERVICE_IMPL_TEMPLATE),
            ("middleware_impl.go.tera", MIDDLEWARE_IMPL_TEMPLATE),
        ])?;
        tera.autoescape_on(vec![]);
        Ok(Self {
            template,
            paths,
            tera,
        })
    }

    /// The resolved output configuration this generator writes into.
    pub fn paths(&self) -> &ResolvedPaths {
        &self.paths
    }

    /// Generate every output file in its fixed order: types, service
    /// interfaces, handlers, the optional gin-context helper, per-service
    /// implementations, and the middleware implementation.
    pub async fn generate(&self) -> Result<()> {
        fs::create_dir_all(&self.paths.output_dir).await?;

        self.generate_types().await?;
        self.generate_service_interfaces().await?;
        self.generate_handlers().await?;

        if self.template.uses_gin_context() {
            self.generate_ginutil().await?;
        }
        if self.template.options.generate_service {
            self.generate_service_impls().await?;
        }
        if self.template.options.generate_middleware {
            self.generate_middleware_impl().await?;
        }

        Ok(())
    }

    async fn generate_types(&self) -> Result<()> {
        let ctx = context::types_context(self.template, &self.paths);
        self.render_to("types.go.tera", &ctx, &self.paths.output_dir.join("types.go"))
            .await
    }

    async fn generate_service_interfaces(&self) -> Result<()> {
        let ctx = context::service_file_context(self.template, &self.paths);
        self.render_to(
            "service.go.tera",
            &ctx,
            &self.paths.output_dir.join("service.go"),
        )
        .await
    }

    async fn generate_handlers(&self) -> Result<()> {
        let ctx = context::handlers_context(self.template, &self.paths);
        self.render_to(
            "handlers.go.tera",
            &ctx,
            &self.paths.output_dir.join("handlers.go"),
        )
        .await
    }

    async fn generate_ginutil(&self) -> Result<()> {
        let ctx = context::ginutil_context(&self.paths);
        self.render_to(
            "ginutil.go.tera",
            &ctx,
            &self.paths.output_dir.join("ginutil.go"),
        )
        .await
    }

    async fn generate_service_impls(&self) -> Result<()> {
        if self.template.services.is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.paths.service_output_dir).await?;

        for service in &self.template.services {
            let path = self
                .paths
                .service_output_dir
                .join(format!("{}.go", file_stem(&service.name)));
            if path.exists() {
                log::warn!("service file already exists, skipping: {}", path.display());
                continue;
            }
            let ctx = context::service_impl_context(service, &self.paths);
            self.render_to("service_impl.go.tera", &ctx, &path).await?;
        }
        Ok(())
    }

    /// Middleware emission is a sync against the model: a non-empty union
    /// writes the stub file once, an empty union deletes a stale file.
    async fn generate_middleware_impl(&self) -> Result<()> {
        let ops = context::middleware_ops(self.template);

        let base = self
            .template
            .services
            .first()
            .map(|s| file_base(&s.name))
            .unwrap_or_else(|| "User".to_string());
        let path = self
            .paths
            .middleware_output_dir
            .join(format!("{}.go", base.to_lowercase()));

        if ops.is_empty() {
            if path.exists() {
                fs::remove_file(&path).await?;
                log::info!(
                    "no middleware referenced, removed stale file: {}",
                    path.display()
                );
            }
            return Ok(());
        }

        if path.exists() {
            log::warn!(
                "middleware file already exists, skipping: {}",
                path.display()
            );
            return Ok(());
        }

        let struct_name = format!("{}Middleware", title(&base));
        let ctx = context::middleware_impl_context(&self.paths, struct_name, ops);
        self.render_to("middleware_impl.go.tera", &ctx, &path).await
    }

    async fn render_to<C: Serialize>(&self, name: &str, ctx: &C, path: &Path) -> Result<()> {
        let rendered = self.tera.render(name, &Context::from_serialize(ctx)?)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        log::debug!("writing {}", path.display());
        fs::write(path, rendered).await?;
        Ok(())
    }
}

/// `UserService` -> `user`: the output file stem for per-service artefacts.
fn file_stem(service_name: &str) -> String {
    file_base(service_name).to_lowercase()
}

/// `UserService` -> `User`.
fn file_base(service_name: &str) -> String {
    service_name
        .strip_suffix("Service")
        .unwrap_or(service_name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_gin_template;
    use crate::resolver::resolve;
    use std::fs as stdfs;
    use tempfile::tempdir;

    async fn run(content: &str, cwd: &Path) -> ResolvedPaths {
        let template = parse_gin_template(content).unwrap();
        let paths = resolve(&template.options, cwd);
        let generator = CodeGenerator::new(&template, paths.clone()).unwrap();
        generator.generate().await.unwrap();
        paths
    }

    fn read(path: &Path) -> String {
        stdfs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
    }

    #[tokio::test]
    async fn minimal_options_create_core_files_only() {
        let dir = tempdir().unwrap();
        let paths = run(
            "options {\n\toutputDir \"./out\"\n\tpackageName \"v1\"\n}\n",
            dir.path(),
        )
        .await;

        assert!(paths.output_dir.join("types.go").exists());
        assert!(paths.output_dir.join("service.go").exists());
        assert!(paths.output_dir.join("handlers.go").exists());
        assert!(!paths.output_dir.join("ginutil.go").exists());

        assert_eq!(read(&paths.output_dir.join("types.go")), "package v1\n");
        assert_eq!(read(&paths.output_dir.join("service.go")), "package v1\n");
        assert_eq!(read(&paths.output_dir.join("handlers.go")), "package v1\n");
    }

    #[tokio::test]
    async fn gin_context_method_emits_helper_and_save_call() {
        let dir = tempdir().unwrap();
        let paths = run(
            "options {\n\toutputDir \"api/demo/v1\"\n\tpackageName \"v1\"\n}\n\nservice DemoService {\n\t@Ping get /ping WithGinContext PingReq PingResp\n}\n",
            dir.path(),
        )
        .await;

        let ginutil = read(&paths.output_dir.join("ginutil.go"));
        assert!(ginutil.contains("func SaveToContext(ctx context.Context, c *gin.Context) context.Context"));

        let handlers = read(&paths.output_dir.join("handlers.go"));
        assert!(handlers.contains("ctx := SaveToContext(c.Request.Context(), c)"));
        assert!(!handlers.contains("ctx := c.Request.Context()\n\tresp, err := h.demoService.Ping"));
    }

    #[tokio::test]
    async fn global_gin_context_option_applies_to_every_method() {
        let dir = tempdir().unwrap();
        let paths = run(
            "options {\n\toutputDir \"api/demo/v1\"\n\tpackageName \"v1\"\n\twithGinContext true\n}\n\nservice DemoService {\n\t@Ping get /ping PingReq PingResp\n}\n",
            dir.path(),
        )
        .await;

        assert!(paths.output_dir.join("ginutil.go").exists());
        let handlers = read(&paths.output_dir.join("handlers.go"));
        assert!(handlers.contains("ctx := SaveToContext(c.Request.Context(), c)"));
    }

    #[tokio::test]
    async fn prefixed_service_composes_routes_under_prefix_group() {
        let dir = tempdir().unwrap();
        let paths = run(
            "options {\n\toutputDir \"api/user/v1\"\n\tpackageName \"v1\"\n}\n\nservice UserService prefix v1 {\n\t@GetUser get /users/:id UserReq UserResp\n}\n",
            dir.path(),
        )
        .await;

        let handlers = read(&paths.output_dir.join("handlers.go"));
        assert!(handlers.contains("PrefixGroup := r.Group(\"/v1\")"));
        assert!(handlers.contains("PrefixGroup.GET(\"/users/:id\", h.GetUser)"));
    }

    #[tokio::test]
    async fn unprefixed_service_uses_engine_root() {
        let dir = tempdir().unwrap();
        let paths = run(
            "options {\n\toutputDir \"api/user/v1\"\n\tpackageName \"v1\"\n}\n\nservice PingService {\n\t@Ping get /ping PingReq PingResp\n}\n",
            dir.path(),
        )
        .await;

        let handlers = read(&paths.output_dir.join("handlers.go"));
        assert!(handlers.contains("\tr.GET(\"/ping\", h.Ping)"));
        assert!(!handlers.contains("PrefixGroup"));
    }

    #[tokio::test]
    async fn group_level_middleware_is_deduplicated_against_service_level() {
        let dir = tempdir().unwrap();
        let paths = run(
            "options {\n\toutputDir \"api/user/v1\"\n\tpackageName \"v1\"\n}\n\nservice UserService prefix v1 {\n\tmiddleware: [\"Auth\"]\n\n\t@GetUser get /users/:id UserReq UserResp\n\n\tgroup @admin /admin {\n\t\tmiddleware: [\"Auth\", \"Admin\"]\n\t\t@PurgeUsers delete /users UserReq UserResp\n\t}\n}\n",
            dir.path(),
        )
        .await;

        let handlers = read(&paths.output_dir.join("handlers.go"));
        assert_eq!(handlers.matches(".Use(h.middleware.Auth())").count(), 1);
        assert!(handlers.contains("AdminGroup.Use(h.middleware.Admin())"));
        assert!(!handlers.contains("AdminGroup.Use(h.middleware.Auth())"));

        // The emitted interface exposes exactly the referenced union.
        assert!(handlers.contains("type Middleware interface {"));
        assert!(handlers.contains("\tAuth() gin.HandlerFunc"));
        assert!(handlers.contains("\tAdmin() gin.HandlerFunc"));
    }

    #[tokio::test]
    async fn standalone_route_yields_a_standalone_handler() {
        let dir = tempdir().unwrap();
        let paths = run(
            "options {\n\toutputDir \"api/sys/v1\"\n\tpackageName \"v1\"\n}\n\n@Version get /version VersionReq VersionResp\n",
            dir.path(),
        )
        .await;

        let handlers = read(&paths.output_dir.join("handlers.go"));
        assert!(handlers.contains("type StandaloneHandler struct {"));
        assert!(handlers.contains("\tr.GET(\"/version\", h.Version)"));

        let service = read(&paths.output_dir.join("service.go"));
        assert!(service.contains("type StandaloneService interface {"));
        assert!(service.contains("Version(ctx context.Context, req *VersionReq) (*VersionResp, error)"));
    }

    #[tokio::test]
    async fn core_files_are_deterministic_across_runs() {
        let dir = tempdir().unwrap();
        let content = "options {\n\toutputDir \"api/user/v1\"\n\tpackageName \"v1\"\n}\n\nservice UserService prefix v1 {\n\tmiddleware: [\"Auth\"]\n\t@GetUser get /users/:id UserReq UserResp\n}\n";

        let paths = run(content, dir.path()).await;
        let first: Vec<String> = ["types.go", "service.go", "handlers.go"]
            .iter()
            .map(|f| read(&paths.output_dir.join(f)))
            .collect();

        let paths = run(content, dir.path()).await;
        let second: Vec<String> = ["types.go", "service.go", "handlers.go"]
            .iter()
            .map(|f| read(&paths.output_dir.join(f)))
            .collect();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn existing_service_impl_is_never_overwritten() {
        let dir = tempdir().unwrap();
        let content = "options {\n\toutputDir \"api/user/v1\"\n\tpackageName \"v1\"\n\tgenerateService true\n}\n\nservice UserService prefix v1 {\n\t@GetUser get /users/:id UserReq UserResp\n}\n";

        run(content, dir.path()).await;
        let impl_path = dir.path().join("internal/service/user.go");
        let generated = read(&impl_path);
        assert!(generated.contains("func NewUserService(logger log.Logger)"));
        assert!(generated.contains("func (s *UserService) GetUser(ctx context.Context"));

        // Simulate hand-edits, then re-run: the file must survive untouched.
        stdfs::write(&impl_path, "package service // edited by hand\n").unwrap();
        run(content, dir.path()).await;
        assert_eq!(read(&impl_path), "package service // edited by hand\n");
    }

    #[tokio::test]
    async fn middleware_impl_is_generated_once_with_full_union() {
        let dir = tempdir().unwrap();
        let content = "options {\n\toutputDir \"api/user/v1\"\n\tpackageName \"v1\"\n\tgenerateMiddleware true\n}\n\nservice UserService prefix v1 {\n\tmiddleware: [\"Auth\", \"Logging\"]\n\n\tgroup @admin /admin {\n\t\tmiddleware: [\"Admin\"]\n\t\t@PurgeUsers delete /users UserReq UserResp\n\t}\n}\n";

        run(content, dir.path()).await;
        let mw_path = dir.path().join("internal/middleware/user.go");
        let generated = read(&mw_path);
        assert!(generated.contains("type UserMiddleware struct {"));
        assert!(generated.contains("func NewUserMiddleware() userV1.Middleware {"));
        for op in ["Auth", "Logging", "Admin"] {
            assert!(
                generated.contains(&format!("func (m *UserMiddleware) {op}() gin.HandlerFunc {{")),
                "missing op {op}"
            );
        }

        stdfs::write(&mw_path, "package middleware // edited\n").unwrap();
        run(content, dir.path()).await;
        assert_eq!(read(&mw_path), "package middleware // edited\n");
    }

    #[tokio::test]
    async fn empty_middleware_union_deletes_stale_file() {
        let dir = tempdir().unwrap();
        let content = "options {\n\toutputDir \"api/user/v1\"\n\tpackageName \"v1\"\n\tgenerateMiddleware true\n}\n\nservice UserService prefix v1 {\n\t@GetUser get /users/:id UserReq UserResp\n}\n";

        let mw_dir = dir.path().join("internal/middleware");
        stdfs::create_dir_all(&mw_dir).unwrap();
        let mw_path = mw_dir.join("user.go");
        stdfs::write(&mw_path, "package middleware\n").unwrap();

        run(content, dir.path()).await;
        assert!(!mw_path.exists());

        // A clean run creates nothing.
        run(content, dir.path()).await;
        assert!(!mw_path.exists());
    }

    #[tokio::test]
    async fn types_preserve_declaration_order_and_field_tags() {
        let dir = tempdir().unwrap();
        let paths = run(
            "options {\n\toutputDir \"api/user/v1\"\n\tpackageName \"v1\"\n}\n\ninfo {\n\ttitle \"User API\"\n\tversion \"1.0.0\"\n}\n\ntype (\n\tUserReq {\n\t\tid int64 `json:\"id\" binding:\"required\"` // user id\n\t}\n\n\tUserResp {\n\t\tname string `json:\"name\"`\n\t}\n)\n",
            dir.path(),
        )
        .await;

        let types = read(&paths.output_dir.join("types.go"));
        assert!(types.starts_with("// User API 1.0.0\npackage v1\n"));
        let req_pos = types.find("type UserReq struct {").unwrap();
        let resp_pos = types.find("type UserResp struct {").unwrap();
        assert!(req_pos < resp_pos);
        assert!(types.contains("\tId int64 `json:\"id\" binding:\"required\"` // user id\n"));
        assert!(types.contains("\tName string `json:\"name\"`\n"));
    }

    #[tokio::test]
    async fn service_interface_includes_group_methods() {
        let dir = tempdir().unwrap();
        let paths = run(
            "options {\n\toutputDir \"api/user/v1\"\n\tpackageName \"v1\"\n}\n\nservice UserService prefix v1 {\n\t@GetUser get /users/:id UserReq UserResp\n\n\tgroup @admin /admin {\n\t\t@PurgeUsers delete /users UserReq UserResp\n\t}\n}\n",
            dir.path(),
        )
        .await;

        let service = read(&paths.output_dir.join("service.go"));
        assert!(service.contains("type UserService interface {"));
        assert!(service.contains("\tGetUser(ctx context.Context, req *UserReq) (*UserResp, error)\n"));
        assert!(service.contains("\tPurgeUsers(ctx context.Context, req *UserReq) (*UserResp, error)\n"));
    }

    #[tokio::test]
    async fn handler_bodies_bind_translate_and_dispatch() {
        let dir = tempdir().unwrap();
        let paths = run(
            "options {\n\toutputDir \"api/user/v1\"\n\tpackageName \"v1\"\n}\n\nservice UserService prefix v1 {\n\t@GetUser get /users/:id UserReq UserResp // fetch one user\n}\n",
            dir.path(),
        )
        .await;

        let handlers = read(&paths.output_dir.join("handlers.go"));
        assert!(handlers.contains("// GetUser fetch one user"));
        assert!(handlers.contains("func (h *UserServiceHandler) GetUser(c *gin.Context) {"));
        assert!(handlers.contains("req := &UserReq{}"));
        assert!(handlers.contains("err = translateValidationError(err, h.translator)"));
        assert!(handlers.contains("resp, err := h.userService.GetUser(ctx, req)"));
        assert!(handlers.contains("kgin.Error(c, err)"));
        assert!(handlers.contains("c.JSON(http.StatusOK, resp)"));
    }
}
