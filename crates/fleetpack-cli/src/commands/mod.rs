//! CLI commands

pub mod show;
pub mod template;
pub mod validate;

use fleetpack_core::{ChartValues, LoadedPack, ReleaseInfo, RenderContext, Values, parse_set_values};
use fleetpack_engine::{Engine, EngineBuilder};
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

/// Values sources given on the command line
#[derive(Debug, Default)]
pub struct ValuesArgs<'a> {
    pub files: &'a [PathBuf],
    pub set: &'a [String],
    pub environment: Option<&'a str>,
}

/// Everything a render needs, assembled from a pack on disk
pub struct RenderInputs {
    pub pack: LoadedPack,
    pub context: RenderContext,
    pub engine: Engine,
}

/// Load a pack and assemble the render context
///
/// Values are layered `values.yaml` ← `-f` files ← `--set`, then decoded;
/// the environment overlay, if any, is applied by the resolver.
pub fn prepare(
    pack_path: &Path,
    release_name: &str,
    namespace: &str,
    args: &ValuesArgs<'_>,
) -> Result<RenderInputs> {
    let pack = LoadedPack::load(pack_path).map_err(CliError::pack_load)?;
    tracing::debug!(
        pack = %pack.pack.metadata.name,
        version = %pack.pack.metadata.version,
        "loaded pack"
    );

    let values = merged_values(&pack, args.files, args.set)?;
    let chart_values = ChartValues::from_values(&values)?;

    let release = ReleaseInfo::new(release_name, namespace);
    let mut context = RenderContext::new(chart_values, release, &pack.pack.metadata);

    if let Some(name) = args.environment {
        let overlay = pack.load_environment(name)?;
        tracing::debug!(environment = name, "loaded environment overlay");
        context = context.with_environment(name, overlay);
    }

    let engine = EngineBuilder::from_config(&pack.pack.engine).build();

    Ok(RenderInputs {
        pack,
        context,
        engine,
    })
}

/// `values.yaml` deep-merged with `-f` files and `--set` overrides
pub fn merged_values(pack: &LoadedPack, files: &[PathBuf], set: &[String]) -> Result<Values> {
    let mut values = pack.load_values()?;

    for file in files {
        let file_values = Values::from_file(file)?;
        values.merge(&file_values);
        tracing::debug!(file = %file.display(), "merged values file");
    }

    if !set.is_empty() {
        let overrides = parse_set_values(set)?;
        values.merge(&overrides);
        tracing::debug!(count = set.len(), "applied --set overrides");
    }

    Ok(values)
}
