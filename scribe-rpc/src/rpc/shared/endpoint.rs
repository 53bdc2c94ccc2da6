use multiaddr::{Multiaddr, Protocol};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EndpointError {
    #[error("rpc error: invalid addr: {0}")]
    InvalidMultiAddr(String),

    #[error("rpc error: empty addr")]
    EmptyMultiAddr,
}

/// `build_endpoint` turns a peer [`Multiaddr`] into the base url of its JSON-RPC server
///
/// The first component must be one of [`Protocol::Ip4`], [`Protocol::Dns`] or [`Protocol::Dns4`].
/// The port comes from a following [`Protocol::Tcp`], port 80 otherwise.
pub fn build_endpoint(addr: Multiaddr) -> Result<String, EndpointError> {
    if addr.is_empty() {
        return Err(EndpointError::EmptyMultiAddr);
    }

    let components = addr.iter().collect::<Vec<_>>();
    let host = match &components[0] {
        Protocol::Ip4(ip) => Ok(ip.to_string()),
        Protocol::Dns(dns) => Ok(dns.to_string()),
        Protocol::Dns4(dns4) => Ok(dns4.to_string()),
        protocol => Err(EndpointError::InvalidMultiAddr(format!(
            "unknown protocol: {}",
            protocol
        ))),
    }?;

    let port = match components.get(1) {
        Some(Protocol::Tcp(port)) => *port,
        _ => 80,
    };

    Ok(format!("http://{}:{}", host, port))
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use multiaddr::multiaddr;

    #[test]
    fn test_multiaddr_invalid() {
        let addr = multiaddr!(Udp(10500u16), QuicV1);
        assert!(matches!(
            build_endpoint(addr),
            Err(EndpointError::InvalidMultiAddr(_))
        ));
    }

    #[test]
    fn test_multiaddr_empty() {
        assert_eq!(
            build_endpoint(Multiaddr::empty()),
            Err(EndpointError::EmptyMultiAddr)
        );
    }

    #[test]
    fn test_multiaddr_valid() {
        let table = vec![
            (multiaddr!(Dns("agent.local"), Tcp(8080u16)), "http://agent.local:8080"),
            (multiaddr!(Dns4("agent.local"), Tcp(8080u16)), "http://agent.local:8080"),
            (
                multiaddr!(Ip4(Ipv4Addr::new(127, 0, 0, 1)), Tcp(8181u16)),
                "http://127.0.0.1:8181",
            ),
            (multiaddr!(Ip4(Ipv4Addr::new(10, 0, 0, 2))), "http://10.0.0.2:80"),
        ];

        for (addr, expected) in table {
            assert_eq!(build_endpoint(addr).unwrap(), expected);
        }
    }
}
