//! The keyword registry: explicit, deterministic step dispatch.
//!
//! Business components self-register their keyword handlers at process
//! start; the registry is then immutable and shared read-only across every
//! worker. Binding the same keyword twice is a hard error at build time, so
//! dispatch never depends on registration order and a typo'd keyword can
//! only fail one way: `KeywordNotFound` at invocation.

use std::collections::HashMap;

use crate::context::StepContext;
use crate::result::{StepOutcome, VolanteError, VolanteResult};

/// A registered keyword handler
pub type StepFn = Box<dyn Fn(&mut StepContext) -> StepOutcome + Send + Sync>;

struct RegisteredStep {
    library: String,
    handler: StepFn,
}

/// A named collection of keyword handlers (a page object or flow library)
pub trait StepLibrary {
    /// Library name, used in duplicate-registration errors
    fn name(&self) -> &'static str;

    /// Bind this library's keywords
    fn register(&self, steps: &mut LibraryRegistrar<'_>) -> VolanteResult<()>;
}

/// Registration handle scoped to one library
pub struct LibraryRegistrar<'a> {
    library: &'a str,
    handlers: &'a mut HashMap<String, RegisteredStep>,
}

impl LibraryRegistrar<'_> {
    /// Bind a keyword to a handler.
    ///
    /// Fails with [`VolanteError::DuplicateKeyword`] if any library already
    /// bound the keyword.
    pub fn step(
        &mut self,
        keyword: impl Into<String>,
        handler: impl Fn(&mut StepContext) -> StepOutcome + Send + Sync + 'static,
    ) -> VolanteResult<()> {
        let keyword = keyword.into();
        if let Some(existing) = self.handlers.get(&keyword) {
            return Err(VolanteError::DuplicateKeyword {
                keyword,
                existing: existing.library.clone(),
            });
        }
        self.handlers.insert(
            keyword,
            RegisteredStep {
                library: self.library.to_string(),
                handler: Box::new(handler),
            },
        );
        Ok(())
    }
}

/// Immutable keyword dispatch table
pub struct KeywordRegistry {
    handlers: HashMap<String, RegisteredStep>,
}

impl KeywordRegistry {
    /// Start building a registry
    #[must_use]
    pub fn builder() -> KeywordRegistryBuilder {
        KeywordRegistryBuilder {
            handlers: HashMap::new(),
        }
    }

    /// Invoke a keyword's handler.
    ///
    /// An unregistered keyword yields a failed outcome on the
    /// "Keyword not found" channel — fatal for the current iteration only.
    pub fn invoke(&self, keyword: &str, ctx: &mut StepContext) -> StepOutcome {
        match self.handlers.get(keyword) {
            Some(step) => (step.handler)(ctx),
            None => VolanteError::KeywordNotFound {
                keyword: keyword.to_string(),
            }
            .into(),
        }
    }

    /// Check whether a keyword is bound
    #[must_use]
    pub fn contains(&self, keyword: &str) -> bool {
        self.handlers.contains_key(keyword)
    }

    /// The library that bound a keyword
    #[must_use]
    pub fn library_of(&self, keyword: &str) -> Option<&str> {
        self.handlers.get(keyword).map(|s| s.library.as_str())
    }

    /// Number of bound keywords
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no keywords are bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for KeywordRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keywords: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        keywords.sort_unstable();
        f.debug_struct("KeywordRegistry")
            .field("keywords", &keywords)
            .finish()
    }
}

/// Builder collecting libraries into a [`KeywordRegistry`]
pub struct KeywordRegistryBuilder {
    handlers: HashMap<String, RegisteredStep>,
}

impl KeywordRegistryBuilder {
    /// Register every keyword of a library
    pub fn library(mut self, library: &dyn StepLibrary) -> VolanteResult<Self> {
        let mut registrar = LibraryRegistrar {
            library: library.name(),
            handlers: &mut self.handlers,
        };
        library.register(&mut registrar)?;
        Ok(self)
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> KeywordRegistry {
        KeywordRegistry {
            handlers: self.handlers,
        }
    }
}

impl std::fmt::Debug for KeywordRegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordRegistryBuilder")
            .field("keywords", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatable::{DataTable, ModuleData, RowSelection};
    use crate::params::TestParameters;
    use crate::report::TestLog;
    use crate::session::{DriverSession, Screenshot};
    use crate::result::VolanteResult as VR;
    use std::time::Duration;

    struct NullSession;

    impl DriverSession for NullSession {
        fn navigate(&mut self, _url: &str) -> VR<()> {
            Ok(())
        }
        fn click(&mut self, _locator: &str) -> VR<()> {
            Ok(())
        }
        fn type_text(&mut self, _locator: &str, _text: &str) -> VR<()> {
            Ok(())
        }
        fn read_text(&mut self, _locator: &str) -> VR<String> {
            Ok(String::new())
        }
        fn execute_script(&mut self, _code: &str) -> VR<String> {
            Ok(String::new())
        }
        fn screenshot(&mut self) -> VR<Screenshot> {
            Ok(Screenshot::new(Vec::new(), 0, 0))
        }
        fn set_timeouts(&mut self, _e: Duration, _p: Duration) -> VR<()> {
            Ok(())
        }
        fn maximize_window(&mut self) -> VR<()> {
            Ok(())
        }
        fn quit(&mut self) -> VR<()> {
            Ok(())
        }
    }

    fn context() -> StepContext {
        StepContext::new(
            TestParameters::new("Login", "ValidCredentials"),
            DataTable::new("Login", ModuleData::default(), RowSelection::Iterative),
            TestLog::new("t"),
            Box::new(NullSession),
            Duration::from_secs(10),
            Duration::from_secs(30),
        )
    }

    struct LoginPage;

    impl StepLibrary for LoginPage {
        fn name(&self) -> &'static str {
            "LoginPage"
        }

        fn register(&self, steps: &mut LibraryRegistrar<'_>) -> VolanteResult<()> {
            steps.step("enterUsername", |_ctx| StepOutcome::Ok)?;
            steps.step("enterPassword", |_ctx| StepOutcome::Ok)?;
            Ok(())
        }
    }

    struct SearchPage;

    impl StepLibrary for SearchPage {
        fn name(&self) -> &'static str {
            "SearchPage"
        }

        fn register(&self, steps: &mut LibraryRegistrar<'_>) -> VolanteResult<()> {
            steps.step("typeQuery", |_ctx| StepOutcome::Ok)
        }
    }

    /// A library colliding with LoginPage
    struct RogueLibrary;

    impl StepLibrary for RogueLibrary {
        fn name(&self) -> &'static str {
            "RogueLibrary"
        }

        fn register(&self, steps: &mut LibraryRegistrar<'_>) -> VolanteResult<()> {
            steps.step("enterUsername", |_ctx| StepOutcome::failed("shadowed"))
        }
    }

    #[test]
    fn test_dispatch_resolves_to_defining_library() {
        let registry = KeywordRegistry::builder()
            .library(&LoginPage)
            .unwrap()
            .library(&SearchPage)
            .unwrap()
            .build();

        assert_eq!(registry.library_of("enterUsername"), Some("LoginPage"));
        assert_eq!(registry.library_of("typeQuery"), Some("SearchPage"));

        let mut ctx = context();
        assert_eq!(registry.invoke("enterUsername", &mut ctx), StepOutcome::Ok);
        assert_eq!(registry.invoke("typeQuery", &mut ctx), StepOutcome::Ok);
    }

    #[test]
    fn test_dispatch_independent_of_registration_order() {
        let forward = KeywordRegistry::builder()
            .library(&LoginPage)
            .unwrap()
            .library(&SearchPage)
            .unwrap()
            .build();
        let reverse = KeywordRegistry::builder()
            .library(&SearchPage)
            .unwrap()
            .library(&LoginPage)
            .unwrap()
            .build();

        for registry in [&forward, &reverse] {
            assert_eq!(registry.library_of("enterUsername"), Some("LoginPage"));
            assert_eq!(registry.library_of("typeQuery"), Some("SearchPage"));
        }
    }

    #[test]
    fn test_duplicate_keyword_is_startup_error() {
        let err = KeywordRegistry::builder()
            .library(&LoginPage)
            .unwrap()
            .library(&RogueLibrary)
            .unwrap_err();

        match err {
            VolanteError::DuplicateKeyword { keyword, existing } => {
                assert_eq!(keyword, "enterUsername");
                assert_eq!(existing, "LoginPage");
            }
            other => panic!("expected DuplicateKeyword, got {other}"),
        }
    }

    #[test]
    fn test_unknown_keyword_fails_on_named_channel() {
        let registry = KeywordRegistry::builder().build();
        let mut ctx = context();
        match registry.invoke("doesNotExist", &mut ctx) {
            StepOutcome::Failed {
                error_name, detail, ..
            } => {
                assert_eq!(error_name, "Keyword not found");
                assert!(detail.contains("doesNotExist"));
            }
            StepOutcome::Ok => panic!("expected failure"),
        }
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<KeywordRegistry>();
    }
}
