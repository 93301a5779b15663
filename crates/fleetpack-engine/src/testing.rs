//! Test fixtures: resolve a values document into synthesizer inputs

use fleetpack_core::{
    ChartValues, ColorRouter, NameGenerator, ResolvedApp, ResolvedGlobal, Resolver,
};

use crate::meta::SynthContext;

pub struct Fixture {
    pub values: ChartValues,
    pub names: NameGenerator,
    pub router: ColorRouter,
    pub global: ResolvedGlobal,
    pub apps: Vec<ResolvedApp>,
}

impl Fixture {
    /// Resolve `yaml` for release `prod` of pack `shop` 1.0.0
    pub fn new(yaml: &str) -> Self {
        let values = ChartValues::from_yaml(yaml).unwrap();
        let router = ColorRouter::default();
        let resolution = Resolver::new(&values, None, "default")
            .with_router(router.clone())
            .resolve();
        let errors = resolution.errors();
        assert!(errors.is_empty(), "fixture does not resolve: {:?}", errors);

        let global = resolution.global.unwrap();
        let apps = resolution.apps.into_iter().map(|a| a.unwrap()).collect();

        Self {
            names: NameGenerator::new("shop", "1.0.0", "prod"),
            values,
            router,
            global,
            apps,
        }
    }

    pub fn app(&self, name: &str) -> &ResolvedApp {
        self.apps.iter().find(|a| a.name == name).unwrap()
    }

    pub fn ctx(&self) -> SynthContext<'_> {
        SynthContext::new(&self.names, &self.router, &self.global)
    }
}
