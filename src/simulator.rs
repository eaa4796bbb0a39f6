/// Sentinel returned instead of text when the visible log should be wiped.
pub const CLEAR: &str = "\x1b[CLEAR]";

pub const PROMPT: &str = "kali@academy:~$ ";

pub const BANNER: [&str; 2] = [
    "Welcome to Kali Linux Terminal Simulator",
    "Type commands to complete your tasks. Use 'clear' to clear the terminal.",
];

#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Whole normalized line equals the pattern.
    Exact(&'static str),
    /// Normalized line starts with the pattern.
    Prefix(&'static str),
    /// Normalized line contains every listed fragment.
    Contains(&'static [&'static str]),
}

impl Matcher {
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            Matcher::Exact(p) => cmd == *p,
            Matcher::Prefix(p) => cmd.starts_with(p),
            Matcher::Contains(parts) => parts.iter().all(|p| cmd.contains(p)),
        }
    }
}

pub struct Rule {
    pub matcher: Matcher,
    pub response: &'static str,
}

const NMAP_PING: &str = "Starting Nmap scan...
Host is up (0.001s latency).
192.168.1.1 - Router
192.168.1.10 - Desktop PC
192.168.1.15 - Mobile Device
Nmap done: 254 IP addresses scanned";

const NMAP_TCP: &str = "Starting Nmap TCP scan...
PORT     STATE SERVICE
22/tcp   open  ssh
80/tcp   open  http
443/tcp  open  https";

const NMAP_VERSION: &str = "Starting Nmap service detection...
PORT     STATE SERVICE VERSION
22/tcp   open  ssh     OpenSSH 7.4
80/tcp   open  http    Apache 2.4.6
443/tcp  open  https   Apache 2.4.6";

const DIRB: &str = "DIRB v2.22
---- Scanning URL: http://target.com/ ----
+ http://target.com/admin (CODE:200|SIZE:1234)
+ http://target.com/config (CODE:403|SIZE:287)
+ http://target.com/login (CODE:200|SIZE:2456)
---- Scan finished ----";

const HYDRA: &str = "Hydra v9.1 starting...
[22][ssh] host: 192.168.1.1   login: admin   password: password123
1 of 1 target successfully completed, 1 valid password found";

/// Evaluated top to bottom, first hit wins. The flags are matched after
/// lower-casing, hence `-st` and `-sv`.
pub const RULES: &[Rule] = &[
    Rule { matcher: Matcher::Contains(&["nmap", "-sn"]), response: NMAP_PING },
    Rule { matcher: Matcher::Contains(&["nmap", "-st"]), response: NMAP_TCP },
    Rule { matcher: Matcher::Contains(&["nmap", "-sv"]), response: NMAP_VERSION },
    Rule { matcher: Matcher::Contains(&["dirb"]), response: DIRB },
    Rule { matcher: Matcher::Contains(&["hydra"]), response: HYDRA },
    Rule { matcher: Matcher::Exact("ls"), response: "Desktop Documents Downloads Pictures" },
    Rule { matcher: Matcher::Exact("pwd"), response: "/home/kali" },
    Rule { matcher: Matcher::Exact("whoami"), response: "kali" },
    Rule { matcher: Matcher::Prefix("cd"), response: "" },
    Rule { matcher: Matcher::Exact("clear"), response: CLEAR },
];

pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Index of the rule that answers `input`, if any.
pub fn classify(input: &str) -> Option<usize> {
    let cmd = normalize(input);
    RULES.iter().position(|r| r.matcher.matches(&cmd))
}

pub fn not_found(input: &str) -> String {
    format!("Command not found: {}", input)
}

/// Canned output for a typed line. Same input, same output.
pub fn simulate(input: &str) -> String {
    match classify(input) {
        Some(i) => RULES[i].response.to_string(),
        None => not_found(input),
    }
}

pub fn is_clear(output: &str) -> bool {
    output == CLEAR
}
