//! Reads a TSL2561 on a Linux I²C bus (e.g. a Raspberry Pi) and prints the
//! raw channels plus both engines' lux values once per second.

use std::thread;
use std::time::Duration;

use env_logger::{Builder, Target};
use linux_embedded_hal::{Delay, I2cdev};
use log::{error, info};
use tsl2561::{Address, Package, Tsl2561};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .init();

    let i2c = I2cdev::new("/dev/i2c-1")?;
    let mut tsl = Tsl2561::new(i2c, Delay, Address::Float, Package::T);

    match tsl.read_id() {
        Ok(id) => info!(
            "TSL2561 found, part number 0x{:X}, revision 0x{:X}",
            id >> 4,
            id & 0x0F
        ),
        Err(e) => error!("Failed to read device ID: {:?}", e),
    }

    loop {
        match tsl.read_raw_luminosity() {
            Ok((broadband, infrared)) => {
                info!("Broadband: {broadband}, infrared: {infrared}");
            }
            Err(e) => error!("Failed to read raw channels: {:?}", e),
        }

        match tsl.read_lux() {
            Ok(lux) => info!("Lux (empirical): {lux:.2}"),
            Err(e) => error!("Failed to read lux: {:?}", e),
        }

        match tsl.read_lux_fixed_point() {
            Ok(lux) => info!("Lux (fixed-point): {lux}"),
            Err(e) => error!("Failed to read lux: {:?}", e),
        }

        thread::sleep(Duration::from_secs(1));
    }
}
