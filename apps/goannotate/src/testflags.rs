//! Permissive reading of `go test` arguments to find target paths.
//!
//! Only value-taking flags need to be known so their values are not taken
//! for targets; everything else that starts with `-` is skipped. Unknown
//! flags never fail.

/// Flags of `go test` and `go build` that take a separate value.
const VALUE_FLAGS: &[&str] = &[
    "asmflags",
    "bench",
    "benchtime",
    "blockprofile",
    "blockprofilerate",
    "buildmode",
    "C",
    "compiler",
    "count",
    "covermode",
    "coverpkg",
    "coverprofile",
    "cpu",
    "cpuprofile",
    "exec",
    "fuzz",
    "fuzzminimizetime",
    "fuzztime",
    "gccgoflags",
    "gcflags",
    "installsuffix",
    "ldflags",
    "list",
    "memprofile",
    "memprofilerate",
    "mod",
    "modfile",
    "mutexprofile",
    "mutexprofilefraction",
    "o",
    "outputdir",
    "overlay",
    "p",
    "parallel",
    "pgo",
    "pkgdir",
    "run",
    "shuffle",
    "skip",
    "tags",
    "timeout",
    "toolexec",
    "trace",
    "vet",
];

fn takes_value(name: &str) -> bool {
    let name = name.strip_prefix("test.").unwrap_or(name);
    VALUE_FLAGS.contains(&name)
}

/// Target paths among `args` (the arguments after the subcommand).
pub fn extract_targets(args: &[String]) -> Vec<String> {
    let mut targets = Vec::new();
    let mut flags_done = false;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if flags_done || !arg.starts_with('-') || arg == "-" {
            targets.push(arg.clone());
            continue;
        }
        if arg == "--" {
            flags_done = true;
            continue;
        }
        let body = arg.trim_start_matches('-');
        let (name, inline_value) = match body.split_once('=') {
            Some((n, _)) => (n, true),
            None => (body, false),
        };
        if name == "args" {
            // Everything after -args belongs to the test binary.
            break;
        }
        if takes_value(name) && !inline_value {
            iter.next();
        }
    }
    targets
}
