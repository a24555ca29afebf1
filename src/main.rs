use leptos::prelude::*;
use link_diagram::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(App);
}
