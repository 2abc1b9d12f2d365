use rpcprims_client::{ClientConfig, RpcClient};
use rpcprims_wire::{catalog_from_value, Kwargs, DISCOVERY_COMMAND};

use crate::cmd::{parse_duration, parse_protocol, OpsArgs};
use crate::exit::{client_error, wire_error, CliResult, SUCCESS};
use crate::output::{print_catalog, OutputFormat};

pub fn run(args: OpsArgs, format: OutputFormat) -> CliResult<i32> {
    let protocol = parse_protocol(args.protocol)?;
    let connect_timeout = parse_duration(&args.connect_timeout)?;

    let config = ClientConfig {
        server: args.server.clone(),
        port: args.port,
        protocol,
        connect_timeout: Some(connect_timeout),
        ..ClientConfig::default()
    };
    let client = RpcClient::connect(config).map_err(|err| client_error("connect failed", err))?;

    // A second discovery through the generic call path shows the catalog
    // verbatim, including any entry that was skipped during stub generation.
    let catalog_value = client
        .call(DISCOVERY_COMMAND, &[], &Kwargs::new())
        .map_err(|err| client_error("discovery failed", err))?;
    let catalog =
        catalog_from_value(&catalog_value).map_err(|err| wire_error("discovery failed", err))?;

    print_catalog(&args.server, args.port, &catalog, format);
    Ok(SUCCESS)
}
