//! AWS provisioning outputs.

use crate::schema::metadata_struct;

metadata_struct! {
    /// Outputs of the AWS provisioning step.
    pub struct AwsMetadata("aws") {
        region: "Region" => "region" (required),
        availability_zone: "AvailabilityZone" => "availability_zone" (required),
        default_subnet_id: "DefaultSubnetID" => "default_subnet_id" (required),
        private_subnet_id: "PrivateSubnetID" => "private_subnet_id" (required),
        vms_security_group_id: "VMsSecurityGroupID" => "vms_security_group_id" (required),
        atc_security_group_id: "ATCSecurityGroupID" => "atc_security_group_id" (required),
        director_security_group_id: "DirectorSecurityGroupID" => "director_security_group_id" (required),
        elb_security_group_id: "ELBSecurityGroupID" => "elb_security_group_id" (required),
        elb_name: "ELBName" => "elb_name" (required),
        director_key_pair: "DirectorKeyPair" => "director_key_pair" (required),
        director_public_ip: "DirectorPublicIP" => "director_public_ip" (required),
        atc_public_ip: "ATCPublicIP" => "atc_public_ip" (required),
        nat_gateway_ip: "NatGatewayIP" => "nat_gateway_ip" (required),
        blobstore_bucket: "BlobstoreBucket" => "blobstore_bucket" (required),
        blobstore_user_access_key_id: "BlobstoreUserAccessKeyID" => "blobstore_user_access_key_id" (required),
        blobstore_secret_access_key: "BlobstoreSecretAccessKey" => "blobstore_user_secret_access_key" (required),
        bosh_user_access_key_id: "BoshUserAccessKeyID" => "bosh_user_access_key_id" (required),
        bosh_secret_access_key: "BoshSecretAccessKey" => "bosh_user_secret_access_key" (required),
        bosh_db_address: "BoshDBAddress" => "bosh_db_address" (required),
        bosh_db_port: "BoshDBPort" => "bosh_db_port" (required),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetadataError;
    use crate::schema::Metadata;

    #[test]
    fn test_field_table_covers_every_output() {
        let keys: Vec<_> = AwsMetadata::fields().iter().map(|f| f.key).collect();
        assert_eq!(keys.len(), 20);
        assert!(keys.contains(&"blobstore_user_secret_access_key"));
        assert!(AwsMetadata::fields().iter().all(|f| f.required));
    }

    #[test]
    fn test_get_region() {
        let raw = br#"{"region": {"value": "eu-west-1"}}"#;
        let metadata = AwsMetadata::decode(raw).unwrap();
        assert_eq!(metadata.get("Region").unwrap(), "eu-west-1");
        assert!(matches!(
            metadata.get("Regionn"),
            Err(MetadataError::FieldNotFound { .. })
        ));
    }
}
