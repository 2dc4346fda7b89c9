use verlet_swarm::run;

fn main() -> anyhow::Result<()> {
    run()
}
