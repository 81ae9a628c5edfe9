use interleave_rs::{Bindings, ExprArena, InterleavingHeuristic, Type};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let mut arena = ExprArena::new();

    let packet = Type::record(
        "Packet",
        vec![
            ("src".to_owned(), Type::UInt),
            ("dst".to_owned(), Type::UInt),
            ("len".to_owned(), Type::UShort),
        ],
    );

    // Two symbolic packets and a symbolic watermark.
    let p = arena.arbitrary(packet.clone());
    let q = arena.arbitrary(packet);
    let limit = arena.arbitrary(Type::UShort);

    // p == q  &&  p.len < limit
    let same = arena.eq(p, q);
    let p_len = arena.get_field(p, "len");
    let small = arena.lt(p_len, limit);
    let root = arena.and(same, small);

    let groups = InterleavingHeuristic::compute(&arena, root, &Bindings::new())?;

    println!("{} variables, {} groups:", arena.num_vars(), groups.len());
    for (i, group) in groups.iter().enumerate() {
        let members: Vec<String> = group
            .iter()
            .map(|&v| format!("{} : {}", v, arena.var_type(v)))
            .collect();
        println!("  group {}: [{}]", i, members.join(", "));
    }

    let time_total = time_total.elapsed();
    println!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
