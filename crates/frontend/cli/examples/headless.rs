use emu_gamecube::buffer::swizzle;
use emu_gamecube::{create_device, Collaborators, DeviceKind, CMD_ORIGIN, CMD_RESET};

fn main() {
    let collaborators = Collaborators::default();
    let mut pad = create_device(DeviceKind::StandardController, 0, &collaborators);

    for (name, cmd) in [("reset", CMD_RESET), ("origin", CMD_ORIGIN)] {
        let mut buf = [0u8; 12];
        buf[swizzle(0)] = cmd;
        let consumed = pad.run_buffer(&mut buf);
        let bytes: Vec<String> = (0..buf.len())
            .map(|i| format!("{:02x}", buf[swizzle(i)]))
            .collect();
        println!("{}: consumed {} -> {}", name, consumed, bytes.join(" "));
    }

    if let Some(words) = pad.get_data() {
        println!("poll: {}", words);
    }
    println!(
        "Save-state: {}",
        serde_json::to_string_pretty(&pad.save_state()).unwrap_or_default()
    );
}
