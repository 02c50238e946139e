use std::env;
// TODO:
//  - More block definitions once the texture set grows
//  - Draw more than one block (chunks come later in the series)
fn main() -> anyhow::Result<()> {
    if cfg!(debug_assertions) {
        env::set_var("RUST_BACKTRACE", "1");
    }
    voxcraft::run()
}
