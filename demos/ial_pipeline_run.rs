use log::info;
use xml_binding_rs::{
    bindings::ial::{self, PipelineRun},
    error::BindingError,
};

const RUN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Run xmlns="http://euclid.esa.org/schema/sys/ial-schema">
  <id>1024</id>
  <pipelineName>VIS_Processing</pipelineName>
  <status>RUNNING</status>
  <taskRun>
    <id>1</id>
    <taskName>vis_calibration</taskName>
    <exitCode>0</exitCode>
    <products>
      <product type="data">EUC_VIS_CAL.fits</product>
    </products>
  </taskRun>
  <taskRun>
    <id>2</id>
    <taskName>vis_stacking</taskName>
  </taskRun>
</Run>
"#;

fn main() -> Result<(), BindingError> {
    env_logger::init();

    let registry = ial::registry()?;
    info!(
        "Loaded {} bindings for {} (generation {})",
        registry.len(),
        registry.namespace(),
        registry.generation()
    );

    let instance = ial::create_from_document(RUN, None, Some("demo.xml"))?;
    let run = instance
        .downcast_ref::<PipelineRun>()
        .ok_or_else(|| BindingError::Serialization("unexpected instance type".to_string()))?;

    println!("Pipeline run {} ({})", run.id, run.pipeline_name);
    for task in &run.task_runs {
        let products = task
            .products
            .as_ref()
            .map_or(0, |list| list.products.len());
        println!(
            "  task {} {}: exit code {:?}, {} product(s)",
            task.id, task.task_name, task.exit_code, products
        );
    }

    println!("{}", instance.to_document()?.to_xml()?);
    Ok(())
}
