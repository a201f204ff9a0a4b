//! The run pipeline: parse bindings, resolve the image, build the
//! invocation and hand it to the matching dispatcher.

use std::path::Path;
use std::sync::Arc;

use wft_runner_core::error::Result;
use wft_runner_core::spec::{parse_ports, parse_volumes};
use wft_runner_core::{image, CommandBuilder, Invocation, InvocationOptions, Properties, ResolvedImage, RunResult};
use wft_runner_runtime::{Dispatcher, DockerCliRefresher};

/// Image and invocation ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    pub image: ResolvedImage,
    pub invocation: Invocation,
}

/// Everything that happens before the engine is touched.
///
/// Malformed bindings and missing configuration fail here.
pub fn prepare(options: &InvocationOptions, properties: &Properties, builder: &CommandBuilder) -> Result<Prepared> {
    let mounts = parse_volumes(&options.volumes)?;
    let ports = parse_ports(&options.ports)?;
    let image = image::resolve(options, &properties.image, &properties.repository)?;
    let invocation = builder.build(options, &image, &mounts, &ports)?;
    Ok(Prepared { image, invocation })
}

/// Run `options` to completion with `program` as the engine command line.
pub async fn execute(
    options: &InvocationOptions,
    properties: &Properties,
    working_dir: &Path,
    program: &str,
) -> Result<RunResult> {
    let builder = CommandBuilder::new(working_dir).with_program(program);
    let prepared = prepare(options, properties, &builder)?;

    let refresher = Arc::new(DockerCliRefresher::with_program(program));
    let dispatcher = Dispatcher::connect(options, refresher).await?;
    dispatcher.run(options, &prepared.image, &prepared.invocation).await
}
