use std::{fs::File, io::Write};

use structopt::StructOpt;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use lather_model::builder::{BuilderConfig, WsdlServiceBuilder};
use lather_model::service::ServiceInfo;
use lather_soap::partial;
use lather_wsdl::manager::WsdlManager;
use lather_wsdl::schema::SchemaSet;
use lather_wsdl::types::Document;
use lather_wsdl::writer;

#[derive(Debug, Error)]
enum Error {
    #[error("Error loading WSDL")]
    Wsdl(#[from] lather_wsdl::error::Error),

    #[error("Error completing partial WSDL")]
    Soap(#[from] lather_soap::error::Error),

    #[error("Error building the service model")]
    Model(#[from] lather_model::error::Error),

    #[error("Error")]
    Io(#[from] std::io::Error),
}

#[derive(StructOpt)]
struct Args {
    /// WSDL document to load, as a path or URL
    input: String,

    /// Synthesize a binding and service around the port type matching this
    /// name when the document declares none
    #[structopt(long)]
    complete: Option<String>,

    /// Write the (completed) document as WSDL to this path instead of
    /// building the service model
    #[structopt(long)]
    emit_wsdl: Option<String>,

    /// Relax the wrapped-operation rules
    #[structopt(long)]
    relaxed: bool,

    /// Accept wrapper children that reference global elements
    #[structopt(long)]
    follow_refs: bool,

    /// Stash the source WSDL constructs on the built model
    #[structopt(long)]
    record_original: bool,

    /// Skip ports with unknown transports instead of failing
    #[structopt(long)]
    ignore_unknown_bindings: bool,
}

#[paw::main]
fn main(args: Args) -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let manager = WsdlManager::new();
    let mut document = (*manager.definition(&args.input)?).clone();

    if let Some(name) = &args.complete {
        complete(&mut document, name, &manager)?;
    }

    if let Some(path) = &args.emit_wsdl {
        let mut file = File::create(path)?;
        write!(&mut file, "{}", writer::write_document(&document)?)?;
        return Ok(());
    }

    let schemas = SchemaSet::from_definition(&document.definition);
    let config = BuilderConfig {
        record_original: args.record_original,
        ignore_unknown_bindings: args.ignore_unknown_bindings,
        relaxed_wrapped_rules: args.relaxed,
        follow_element_refs: args.follow_refs,
        ..Default::default()
    };

    let builder = WsdlServiceBuilder::with_config(&document, &schemas, config);
    for service in builder.build_services()? {
        print_service(&service, &document);
    }

    Ok(())
}

fn complete(document: &mut Document, name: &str, manager: &WsdlManager) -> Result<(), Error> {
    if partial::find_binding(&document.definition, name).is_none() {
        let binding = partial::append_binding(document, name, manager.registry())?;
        partial::append_service(document, name, binding, manager.registry())?;
    }

    Ok(())
}

fn print_service(service: &ServiceInfo, document: &Document) {
    println!("service {}", document.namespaces.qualified(&service.name));
    println!("  interface {}", service.interface.name.name);

    for operation in &service.interface.operations {
        let exchange = if operation.is_one_way() {
            "one-way"
        } else {
            "request-response"
        };
        let wrapped = if operation.is_unwrapped_capable() {
            ", wrapped"
        } else {
            ""
        };
        println!("    operation {} ({}{})", operation.name, exchange, wrapped);

        if let Some(unwrapped) = &operation.unwrapped {
            for part in &unwrapped.input.parts {
                println!("      in  {}", part.name);
            }
            if let Some(output) = &unwrapped.output {
                for part in &output.parts {
                    println!("      out {}", part.name);
                }
            }
        }

        for fault in &operation.faults {
            println!("      fault {}", fault.name);
        }
    }

    for binding in &service.bindings {
        println!(
            "  binding {} ({} operations)",
            binding.name.name,
            binding.operations.len()
        );
    }

    for endpoint in &service.endpoints {
        println!(
            "  endpoint {} at {}",
            endpoint.name,
            endpoint.address.as_deref().unwrap_or("<no address>")
        );
    }
}
