use geoacl::entrypoint::start_geoacl;

pub fn main() {
    if let Err(err) = start_geoacl() {
        log::error!("GeoACL server terminated: {}", err.to_str());
        std::process::exit(1);
    }
}
