//! GCP provisioning outputs.

use crate::schema::metadata_struct;

metadata_struct! {
    /// Outputs of the GCP provisioning step.
    ///
    /// The two internal gateway keys keep the provisioning tool's spelling.
    pub struct GcpMetadata("gcp") {
        network: "Network" => "network" (required),
        private_subnetwork_name: "PrivateSubnetworkName" => "private_subnetwork_name" (required),
        public_subnetwork_name: "PublicSubnetworkName" => "public_subnetwork_name" (required),
        public_subnetwork_cidr: "PublicSubnetworkCidr" => "public_subnetwork_cidr" (required),
        private_subnetwork_cidr: "PrivateSubnetworkCidr" => "private_subnetwork_cidr" (required),
        private_subnetwork_internal_gw: "PrivateSubnetworInternalGw" => "private_subnetwor_internal_gw" (required),
        public_subnetwork_internal_gw: "PublicSubnetworInternalGw" => "public_subnetwor_internal_gw" (required),
        atc_public_ip: "ATCPublicIP" => "atc_public_ip" (required),
        director_account_creds: "DirectorAccountCreds" => "director_account_creds" (required),
        director_public_ip: "DirectorPublicIP" => "director_public_ip" (required),
        bosh_db_address: "BoshDBAddress" => "bosh_db_address" (required),
        db_name: "DBName" => "db_name" (required),
        nat_gateway_ip: "NatGatewayIP" => "nat_gateway_ip" (required),
        sql_server_cert: "SQLServerCert" => "server_ca_cert" (required),
        director_firewall_name: "DirectorSecurityGroupID" => "director_firewall_name" (required),
    }
}
