use auvgate_control::{ControlConfig, Parcel, RangePolicy, VehicleState};

use crate::cmd::EncodeArgs;
use crate::exit::{control_error, CliResult, SUCCESS};
use crate::output::{print_command, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = ControlConfig {
        range_policy: if args.clamp_thrust {
            RangePolicy::Clamp
        } else {
            RangePolicy::Reject
        },
        ..ControlConfig::default()
    };

    let mut state = VehicleState::new();
    state
        .merge(args.json.as_bytes(), &config)
        .map_err(|err| control_error("control message rejected", err))?;

    let parcels = if args.all {
        drain(&mut state)
    } else {
        vec![state.next_parcel()]
    };

    for parcel in parcels {
        let frame = parcel.encode();
        print_command(&parcel.command(), &frame, format);
    }

    Ok(SUCCESS)
}

/// Every parcel the vehicle would receive, in order, ending with the state.
fn drain(state: &mut VehicleState) -> Vec<Parcel> {
    let mut parcels = Vec::new();
    loop {
        let parcel = state.next_parcel();
        state.acknowledge(&parcel);
        let done = matches!(parcel, Parcel::State(_));
        parcels.push(parcel);
        if done {
            return parcels;
        }
    }
}
