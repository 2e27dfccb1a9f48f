fn main() -> anyhow::Result<()> {
    astroscene::run()
}
