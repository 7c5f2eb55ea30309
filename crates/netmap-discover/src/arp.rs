//! ARP table parsing.
//!
//! Handles the BSD/macOS and net-tools forms of `arp -a`:
//!
//! ```text
//! router.lan (192.168.1.1) at 0:11:22:33:44:55 on en0 ifscope [ethernet]
//! ? (192.168.1.50) at (incomplete) on en0 ifscope [ethernet]
//! ? (10.0.0.7) at aa:bb:cc:dd:ee:ff [ether] on eth0
//! ```

use std::net::IpAddr;

use crate::backend::HostSighting;

const BROADCAST_MAC: &str = "ff:ff:ff:ff:ff:ff";

/// Parse `arp -a` output. Malformed lines are skipped; broadcast and
/// multicast entries are not hosts and are dropped.
pub fn parse_arp_table(output: &str) -> Vec<HostSighting> {
    output.lines().filter_map(parse_arp_line).collect()
}

fn parse_arp_line(line: &str) -> Option<HostSighting> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 || tokens[2] != "at" {
        return None;
    }

    let ip = tokens[1].strip_prefix('(')?.strip_suffix(')')?;
    let parsed: IpAddr = ip.parse().ok()?;
    if parsed.is_multicast() {
        return None;
    }

    let hostname = match tokens[0] {
        "?" => None,
        name => Some(name.to_string()),
    };

    let mac_address = match tokens[3] {
        "(incomplete)" | "<incomplete>" => None,
        raw => Some(normalize_mac(raw)),
    };
    if mac_address.as_deref() == Some(BROADCAST_MAC) {
        return None;
    }

    let interface_name = tokens
        .iter()
        .position(|t| *t == "on")
        .and_then(|i| tokens.get(i + 1))
        .map(|s| s.to_string());

    Some(HostSighting {
        ip_address: parsed.to_string(),
        hostname,
        mac_address,
        interface_name,
    })
}

/// Zero-pad and lowercase each octet: `0:1A:2b:3:4:5` -> `00:1a:2b:03:04:05`.
fn normalize_mac(raw: &str) -> String {
    let octets: Vec<&str> = raw.split(':').collect();
    if octets.len() != 6 || octets.iter().any(|o| o.is_empty() || o.len() > 2) {
        return raw.to_ascii_lowercase();
    }
    octets
        .iter()
        .map(|o| format!("{:0>2}", o.to_ascii_lowercase()))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MACOS: &str = "\
router.lan (192.168.1.1) at 0:11:22:33:44:55 on en0 ifscope [ethernet]
? (192.168.1.50) at (incomplete) on en0 ifscope [ethernet]
? (192.168.1.255) at ff:ff:ff:ff:ff:ff on en0 ifscope [ethernet]
? (224.0.0.251) at 1:0:5e:0:0:fb on en0 ifscope permanent [ethernet]
nas.lan (192.168.1.20) at A4:5E:60:D1:2:9 on en0 ifscope [ethernet]
";

    const LINUX: &str = "\
? (10.0.0.1) at aa:bb:cc:dd:ee:ff [ether] on eth0
? (10.0.0.9) at <incomplete> on eth0
";

    #[test]
    fn parses_macos_table() {
        let hosts = parse_arp_table(MACOS);
        assert_eq!(hosts.len(), 3);

        assert_eq!(hosts[0].ip_address, "192.168.1.1");
        assert_eq!(hosts[0].hostname.as_deref(), Some("router.lan"));
        assert_eq!(hosts[0].mac_address.as_deref(), Some("00:11:22:33:44:55"));
        assert_eq!(hosts[0].interface_name.as_deref(), Some("en0"));

        assert_eq!(hosts[1].ip_address, "192.168.1.50");
        assert!(hosts[1].hostname.is_none());
        assert!(hosts[1].mac_address.is_none());

        assert_eq!(hosts[2].mac_address.as_deref(), Some("a4:5e:60:d1:02:09"));
    }

    #[test]
    fn parses_linux_table() {
        let hosts = parse_arp_table(LINUX);
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].interface_name.as_deref(), Some("eth0"));
        assert_eq!(hosts[0].mac_address.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
        assert!(hosts[1].mac_address.is_none());
    }

    #[test]
    fn skips_malformed_lines() {
        let output = "garbage\n? (not-an-ip) at aa:bb:cc:dd:ee:ff on en0\n\n? 10.0.0.1 at x on en0\n";
        assert!(parse_arp_table(output).is_empty());
    }
}
