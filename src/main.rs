use clap::{Parser, Subcommand};
use sensornet_rs::{
    address_for, frequency_for, init_logger, log_info, pipe_location, ConfigRecord, Gateway,
    HostLink, MockMotionSensor, MockRadio, MotionFlags, Node, SensorNetError, TelemetryPacket,
    TransmitPolicy,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Parser)]
#[command(name = "sensornet-cli")]
#[command(about = "CLI tool for the wireless motion telemetry network")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a gateway loop against a host serial link. Hardware radio drivers
    /// plug in through the Radio trait; this front-end wires mock radios.
    Gateway {
        port: String,
        #[arg(short, long, default_value = "115200")]
        baudrate: u32,
        #[arg(short, long, default_value = "1")]
        radios: usize,
    },
    /// Print the derived addressing for a channel id.
    Address {
        channel: u8,
        #[arg(short, long, default_value = "3")]
        radios: usize,
    },
    /// Run one telemetry/configuration round trip between mock devices.
    Demo,
}

#[tokio::main]
async fn main() -> Result<(), SensorNetError> {
    init_logger();

    let cli = Cli::parse();
    match cli.command {
        Commands::Gateway {
            port,
            baudrate,
            radios,
        } => {
            let link = HostLink::connect(&port, baudrate).await?;
            let boxed = (0..radios)
                .map(|_| Box::new(MockRadio::new()) as Box<dyn sensornet_rs::Radio>)
                .collect();
            let mut gateway = Gateway::new(boxed, link);
            gateway.init().await?;
            log_info(&format!("Gateway up on {port} with {radios} radio(s)"));
            gateway.run().await
        }
        Commands::Address { channel, radios } => {
            log_info(&format!("Address:   0x{:010X}", address_for(channel)));
            log_info(&format!("Frequency: {}", frequency_for(channel)));
            match pipe_location(channel, radios) {
                Ok((radio, pipe)) => log_info(&format!("Location:  radio {radio}, pipe {pipe}")),
                Err(err) => log_info(&format!("Location:  {err}")),
            }
            Ok(())
        }
        Commands::Demo => run_demo().await,
    }
}

/// Drives a mock node and a mock gateway through one full exchange: motion
/// telemetry to the host, then a host configuration update delivered back to
/// the node on the acknowledgment of its next packet.
async fn run_demo() -> Result<(), SensorNetError> {
    let (gateway_io, mut host_io) = tokio::io::duplex(256);

    let node_radio = MockRadio::new();
    let sensor = MockMotionSensor::new();
    let mut node = Node::new(
        node_radio.clone(),
        sensor.clone(),
        5,
        TransmitPolicy::OnMotion,
    )
    .await?;

    let gateway_radio = MockRadio::new();
    let mut gateway = Gateway::new(vec![Box::new(gateway_radio.clone())], HostLink::new(gateway_io));
    gateway.init().await?;

    // Motion on the node produces a telemetry packet.
    sensor.set_acceleration(1200, -80, 16384);
    sensor.trigger_motion(40, MotionFlags::X_POS);
    node.run_cycle(50).await?;
    let over_the_air = node_radio
        .transmitted()
        .last()
        .cloned()
        .expect("node transmitted");
    gateway_radio.queue_packet(&over_the_air);

    // Meanwhile the host requests a higher threshold for channel 5.
    let frame = ConfigRecord {
        id: 5,
        threshold: 80,
        duration: 10,
    }
    .encode_frame();
    host_io
        .write_all(&frame)
        .await
        .map_err(|e| SensorNetError::SerialPortError(e.to_string()))?;

    // Cycle 1: telemetry reaches the host, the config frame is filed.
    gateway.run_cycle().await?;
    let mut uplink = vec![0u8; 64];
    let n = host_io
        .read(&mut uplink)
        .await
        .map_err(|e| SensorNetError::SerialPortError(e.to_string()))?;
    let packet = TelemetryPacket::decode(&uplink[2..n - 1])?;
    log_info(&format!(
        "Host received: channel {} accel {:?} motion {:02X}",
        packet.id,
        packet.accel,
        packet.motion.bits()
    ));

    // Cycle 2: the next telemetry piggybacks the configuration.
    sensor.trigger_motion(90, MotionFlags::Z_NEG);
    node.run_cycle(100).await?;
    gateway_radio.queue_packet(&node_radio.transmitted().last().cloned().unwrap());
    gateway.run_cycle().await?;
    let (pipe, payload) = gateway_radio
        .ack_payloads_written()
        .last()
        .cloned()
        .expect("ack payload queued");
    log_info(&format!("Gateway queued ack-payload on pipe {pipe}"));

    // The node consumes it with its following transmit.
    node_radio.queue_ack_payload(&payload);
    sensor.trigger_motion(140, MotionFlags::Y_POS);
    node.run_cycle(150).await?;
    log_info(&format!(
        "Node now at threshold {} duration {}",
        node.threshold(),
        node.duration()
    ));

    Ok(())
}
