use embassy_futures::block_on;
use hp_led_shield::{linux::LinuxProvider, BoardConfig, ChannelIndex, HpLedShield, Role};

fn main() {
    env_logger::init();

    // handles only decimal bus numbers
    let bus_number: u8 = std::env::args()
        .nth(1)
        .map_or(Ok(0), |arg| arg.parse())
        .expect("Error: bus number is not a number!");
    let config = BoardConfig::default().with_bus_number(bus_number);

    let mut shield: HpLedShield<_> =
        block_on(HpLedShield::connect(&mut LinuxProvider, config)).unwrap();
    for role in Role::ALL {
        if let Some(device) = shield.device(role) {
            println!("{role} at {:#04x}: {:?}", device.address, device.id);
        }
    }

    block_on(shield.begin()).unwrap();
    for index in ChannelIndex::ALL {
        println!(
            "channel {}: live {:?}, eeprom {:?}",
            index.get(),
            shield.channel(index),
            shield.eeprom_channel(index)
        );
    }
    println!("{} °C", block_on(shield.read_temperature()).unwrap());
}
