use anyhow::Result;
use clap::Parser;
use elevator_sim::{Config, EndCondition};

#[derive(Parser)]
struct Args {
    /// Number of floors.
    #[clap(long, default_value_t = 10)]
    floors: usize,
    /// Number of elevators.
    #[clap(long, default_value_t = 3)]
    elevators: usize,
    /// Elevator capacity (shared by every car).
    #[clap(long, default_value_t = 10)]
    capacity: usize,
    /// Passengers per second, on average.
    #[clap(long, default_value_t = 0.5)]
    spawn_rate: f64,
    /// Elevator speed in floors per second.
    #[clap(long, default_value_t = 2.6)]
    speed: f64,
    /// Transport this many passengers to end the challenge.
    #[clap(long, default_value_t = 50)]
    count: u64,
    /// ... within this many seconds.
    #[clap(long, default_value_t = 300.0)]
    seconds: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config {
        floor_count: args.floors,
        elevator_count: args.elevators,
        elevator_capacities: vec![args.capacity],
        spawn_rate: args.spawn_rate,
        speed_floors_per_sec: args.speed,
        end_condition: EndCondition::TransportNWithinTime {
            n: args.count,
            t: args.seconds,
        },
    };
    config.validate()?;

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
