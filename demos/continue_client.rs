use log::*;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use wsconduit::{ClientConfig, Connection, Message};

fn handle_connection(addr: &str) {
    match Connection::connect(addr, ClientConfig::default()) {
        Ok(mut conn) => {
            let my_random_string = generate_random_string();
            info!("Sending random string: {}", my_random_string);
            if conn.send_message(Message::Text(my_random_string)).is_err() {
                error!("Error occurred when sending data in chunks");
            }

            conn.disconnect().unwrap();
        }
        Err(err) => error!("Error when performing handshake: {}", err),
    }
}

fn main() {
    env_logger::init();
    handle_connection("ws://127.0.0.1:9002");
}

fn generate_random_string() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(30)
        .map(char::from)
        .collect()
}
